//! Logger backed by the `tracing` crate

use super::traits::Logger;

/// Target every event is emitted under
pub const LOG_TARGET: &str = "cfgbind";

/// Forwards messages to `tracing` under the `cfgbind` target
///
/// Output depends on the subscriber the application installs; without one
/// the messages are discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: LOG_TARGET, "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: LOG_TARGET, "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: LOG_TARGET, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: LOG_TARGET, "{}", message);
    }
}
