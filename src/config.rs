//! Engine configuration.
//!
//! The engine has no configuration file of its own: its knobs are ordinary
//! options under the `tactic.` prefix, so they can be set globally in an
//! options file and overridden for a sub-tactic with `using_params`.

use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::options::Options;

/// Option key for the stack size of worker threads, in bytes.
pub const WORKER_STACK_SIZE: &str = "tactic.worker_stack_size";

/// Option key for the name prefix of worker threads.
pub const WORKER_NAME: &str = "tactic.worker_name";

/// Option key for the default `try_for` budget, in milliseconds.
pub const TRY_FOR_MS: &str = "tactic.try_for_ms";

/// Configuration for worker threads and default budgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Stack size for `try_for`/`par` worker threads. `None` uses the
    /// platform default.
    pub worker_stack_size: Option<usize>,

    /// Prefix for worker thread names.
    pub worker_name: String,

    /// Budget used by `try_for_default`, in milliseconds.
    pub try_for_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_stack_size: None,
            worker_name: "tactic-worker".to_string(),
            try_for_ms: 10_000,
        }
    }
}

impl EngineConfig {
    /// Read the configuration from an option store, keeping defaults for
    /// anything unset.
    pub fn from_options(options: &Options) -> Self {
        let defaults = Self::default();
        let worker_stack_size = match options.get_unsigned(WORKER_STACK_SIZE, 0) {
            0 => None,
            size => usize::try_from(size).ok(),
        };
        Self {
            worker_stack_size,
            worker_name: options.get_string(WORKER_NAME, &defaults.worker_name),
            try_for_ms: options.get_unsigned(TRY_FOR_MS, defaults.try_for_ms),
        }
    }

    /// Set the worker stack size.
    pub fn with_worker_stack_size(mut self, bytes: usize) -> Self {
        self.worker_stack_size = Some(bytes);
        self
    }

    /// Set the worker thread name prefix.
    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Set the default `try_for` budget.
    pub fn with_try_for_ms(mut self, ms: u64) -> Self {
        self.try_for_ms = ms;
        self
    }

    /// Default `try_for` budget as a duration.
    pub fn try_for_budget(&self) -> Duration {
        Duration::from_millis(self.try_for_ms)
    }

    /// Thread builder for the `index`-th worker of a combinator.
    pub(crate) fn worker_builder(&self, role: &str, index: usize) -> std::thread::Builder {
        let builder =
            std::thread::Builder::new().name(format!("{}-{}-{}", self.worker_name, role, index));
        match self.worker_stack_size {
            Some(size) => builder.stack_size(size),
            None => builder,
        }
    }

    /// Encode this configuration as options.
    pub fn to_options(&self) -> Options {
        let options = Options::new()
            .set(WORKER_NAME, self.worker_name.as_str())
            .set(TRY_FOR_MS, self.try_for_ms);
        match self.worker_stack_size {
            Some(size) => options.set(WORKER_STACK_SIZE, size as u64),
            None => options,
        }
    }
}

/// Load an options file (a JSON object, nested objects flattened into
/// dotted names).
pub fn load_options(path: impl AsRef<Path>) -> Result<Options> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    Options::from_json_str(&text)
        .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
}
