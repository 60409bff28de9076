//! Error types for tactic-core.

use thiserror::Error;

use crate::kernel::KernelError;

/// Result type alias using tactic-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running tactics.
///
/// An empty result sequence is the ordinary way a tactic fails and is not an
/// error. `Failed` is only produced by the solve driver once the whole search
/// space has been exhausted.
#[derive(Error, Debug)]
pub enum Error {
    /// The tactic produced no closed proof state
    #[error("tactic failed: no closed proof state found ({remaining_goals} goals open in last state)")]
    Failed { remaining_goals: usize },

    /// Execution was cancelled at an interruption checkpoint
    #[error("interrupted")]
    Interrupted,

    /// Error raised by the kernel collaborator
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    /// Proof builder received the wrong number of sub-proofs
    #[error("proof builder expected {expected} proofs, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// Worker thread for `try_for`/`par` could not be started
    #[error("failed to spawn tactic worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// Worker thread panicked while running a tactic
    #[error("tactic worker panicked")]
    WorkerPanicked,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a tactic failure error.
    pub fn failed(remaining_goals: usize) -> Self {
        Self::Failed { remaining_goals }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an arity mismatch error.
    pub fn arity_mismatch(expected: usize, actual: usize) -> Self {
        Self::ArityMismatch { expected, actual }
    }

    /// Whether this is a cooperative interruption.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }

    /// Whether this is an ordinary tactic failure surfaced by `solve`.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
