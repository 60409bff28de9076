//! Term and declaration collaborator.
//!
//! The tactic engine treats terms as opaque values: it builds goals from
//! them, compares targets with hypotheses syntactically, and hands assembled
//! proof terms back to the caller. Type inference lives here so callers can
//! validate what `solve` returns; the engine itself never calls it.

pub mod environment;
pub mod expr;

use thiserror::Error;

pub use environment::Environment;
pub use expr::{And, Const, Expr, Implies, Local, Name};

/// Errors raised by the kernel collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Reference to an undeclared constant
    #[error("unknown constant '{0}'")]
    UnknownConstant(Name),

    /// Reference to a hypothesis not in the local context
    #[error("unknown hypothesis '{0}'")]
    UnknownLocal(Name),

    /// A constant was declared twice
    #[error("'{0}' is already declared")]
    AlreadyDeclared(Name),

    /// An expression was used where a proposition is required
    #[error("expected a proposition, got '{0}'")]
    NotAProposition(Expr),

    /// Two types that must agree do not
    #[error("type mismatch: expected '{expected}', got '{actual}'")]
    TypeMismatch { expected: Expr, actual: Expr },
}
