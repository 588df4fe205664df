//! Progress reporting contract between the pipeline and its caller

use tracing::info;

/// Receives raw engine output, status labels and numeric progress.
///
/// Single writer at a time, but the log-tailing task and the controlling
/// task both hold a handle, so implementations must be `Send + Sync`.
pub trait ProgressSink: Send + Sync {
    /// A raw text line, forwarded verbatim from the engine log.
    fn log(&self, line: &str);

    /// A short status label; an empty string clears it.
    fn set_status(&self, status: &str);

    /// Progress fraction in `[0, 1]`.
    fn set_progress(&self, fraction: f64);
}

/// Discards everything.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn log(&self, _line: &str) {}

    fn set_status(&self, _status: &str) {}

    fn set_progress(&self, _fraction: f64) {}
}

/// Forwards everything to the `tracing` subscriber.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn log(&self, line: &str) {
        info!(target: "cellseg::engine", "{}", line);
    }

    fn set_status(&self, status: &str) {
        if !status.is_empty() {
            info!(target: "cellseg::engine", status = status);
        }
    }

    fn set_progress(&self, fraction: f64) {
        info!(target: "cellseg::engine", progress = fraction);
    }
}
