use tracing::error;

use crate::error::EngineError;

/// Fire-and-forget sink for errors the engine cannot act on itself.
/// Implementations forward to whatever human-visible channel exists.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &EngineError, source: &str);
}

/// Default reporter: a structured log line, nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &EngineError, source: &str) {
        error!(source = source, "❌ unexpected timer engine error: {error}");
    }
}
