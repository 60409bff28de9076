//! Property-based tests for the tactic combinators using proptest.
//!
//! These tests check the algebraic laws the search relies on:
//!
//! - `orelse` is left-biased and only consults its second branch on failure
//! - `then` multiplies result counts and is absorbed by failure
//! - `repeat_at_most` never runs its body more often than its bound
//! - `par` succeeds exactly when one of its branches does
