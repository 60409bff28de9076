//! # tactic-core
//!
//! Tactic combinator engine for an interactive theorem prover: proof states,
//! lazy tactic result sequences, and the combinators that compose them into
//! proof-search procedures.
//!
//! ## Core Components
//!
//! - **Proof states**: goals under hypothesis contexts plus the continuation
//!   that assembles the final proof term
//! - **Tactics**: immutable, shareable search procedures returning lazy
//!   sequences of alternative states
//! - **Combinators**: sequencing, choice, repetition, conditionals
//! - **Cancellation**: cooperative interruption, `try_for` time limits and
//!   `par` OR-parallel racing
//! - **IO overlays**: `suppress_trace` and `using_params`
//! - **Solve driver**: finds the first closed state and returns its proof
//!
//! ## Example
//!
//! ```rust,ignore
//! use tactic_core::{assumption_tactic, now_tactic, then, Context, Const, Environment, Expr, IoState};
//!
//! let mut env = Environment::new();
//! env.add_var("p", Expr::Bool)?;
//! let ctx = Context::new().extend("H1", Const("p"));
//!
//! let t = then(&assumption_tactic(), &now_tactic());
//! let proof = t.solve_goal(&env, &IoState::default(), &ctx, Const("p"))?;
//! assert_eq!(proof.to_string(), "H1");
//! ```

pub mod config;
pub mod error;
pub mod goal;
pub mod io_state;
pub mod kernel;
pub mod options;
pub mod proof_state;
pub mod solve;
pub mod tactic;

// Re-exports for convenience
pub use config::{load_options, EngineConfig};
pub use error::{Error, Result};
pub use goal::{Context, Goal};
pub use io_state::{BufferSink, DiagnosticSink, IoState, NullSink, StreamSink, TracingSink};
pub use kernel::{And, Const, Environment, Expr, Implies, KernelError, Local, Name};
pub use options::{OptionValue, Options};
pub use proof_state::{to_proof_state, ProofBuilder, ProofState};
pub use solve::{solve, solve_goal};
pub use tactic::{
    append, assumption_tactic, check_interrupted, cond, conj_tactic, fail_tactic, id_tactic,
    imp_tactic, mk_tactic, mk_tactic01, mk_tactic1, now_tactic, orelse, orelse_all, par, par_all,
    repeat, repeat_at_most, suppress_trace, then, then_all, trace_state_tactic, trace_tactic,
    try_for, try_for_default, using_params, when, Predicate, ProofStateSeq, Tactic, TacticFn,
};
