//! IO context threaded through every tactic application.
//!
//! An [`IoState`] bundles the diagnostic sink, the option overlay and the
//! cancellation token of the current execution. It is passed explicitly into
//! each `apply` call; wrappers such as `suppress_trace` and `using_params`
//! derive a modified copy for the tactic they wrap, so the caller's view is
//! never touched and nothing has to be restored afterwards.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::options::Options;

/// Destination for diagnostic text written by tactics.
pub trait DiagnosticSink: Send + Sync {
    /// Write a chunk of text.
    fn write_str(&self, text: &str);

    /// Flush buffered output, if the sink buffers.
    fn flush(&self) {}
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn write_str(&self, _text: &str) {}
}

/// In-memory sink; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    buffer: Arc<Mutex<String>>,
}

impl BufferSink {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        self.buffer.lock().clone()
    }

    /// Discard the buffered text.
    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl DiagnosticSink for BufferSink {
    fn write_str(&self, text: &str) {
        self.buffer.lock().push_str(text);
    }
}

/// Sink writing to any `Write` implementation (stderr, a file, a socket).
pub struct StreamSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> StreamSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl StreamSink<std::io::Stderr> {
    /// Sink writing to the process's standard error.
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> DiagnosticSink for StreamSink<W> {
    fn write_str(&self, text: &str) {
        if let Err(e) = self.writer.lock().write_all(text.as_bytes()) {
            tracing::warn!("diagnostic write failed: {}", e);
        }
    }

    fn flush(&self) {
        if let Err(e) = self.writer.lock().flush() {
            tracing::warn!("diagnostic flush failed: {}", e);
        }
    }
}

/// Sink forwarding each write to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn write_str(&self, text: &str) {
        let text = text.trim_end_matches('\n');
        if !text.is_empty() {
            tracing::info!(target: "tactic_core::diagnostic", "{}", text);
        }
    }
}

/// Diagnostic sink, option overlay and cancellation scope of one execution.
#[derive(Clone)]
pub struct IoState {
    options: Options,
    sink: Arc<dyn DiagnosticSink>,
    cancellation: CancellationToken,
}

impl IoState {
    /// Create an IO state with its own, fresh cancellation scope.
    pub fn new(options: Options, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            options,
            sink,
            cancellation: CancellationToken::new(),
        }
    }

    /// Current option overlay.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Current diagnostic sink.
    pub fn diagnostic(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    /// Shared handle to the diagnostic sink.
    pub fn sink(&self) -> Arc<dyn DiagnosticSink> {
        Arc::clone(&self.sink)
    }

    /// Cancellation token of the current execution.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Copy with a different option overlay.
    pub fn with_options(&self, options: Options) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }

    /// Copy with a different diagnostic sink.
    pub fn with_sink(&self, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            sink,
            ..self.clone()
        }
    }

    /// Copy running under a different cancellation token.
    pub fn with_cancellation(&self, cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            ..self.clone()
        }
    }

    /// Copy whose cancellation token is a child of this one.
    ///
    /// Cancelling the child leaves this scope alone; cancelling this scope
    /// also cancels the child.
    pub fn child_scope(&self) -> Self {
        self.with_cancellation(self.cancellation.child_token())
    }

    /// Interruption checkpoint for the current execution.
    pub fn check_interrupted(&self) -> Result<()> {
        crate::tactic::interrupt::check_interrupted(&self.cancellation)
    }
}

impl Default for IoState {
    fn default() -> Self {
        Self::new(Options::new(), Arc::new(TracingSink))
    }
}

impl fmt::Debug for IoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoState")
            .field("options", &self.options)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}
