//! Attempt observer: receives every failed attempt before the retry decision.

use tracing::Level;

use crate::remote::RemoteError;

/// Receives one record per failed attempt.
pub trait RetryObserver: Send + Sync {
    fn record(&self, level: Level, message: &str, error: &RemoteError);
}

/// Forwards attempt records to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RetryObserver for TracingObserver {
    fn record(&self, level: Level, message: &str, error: &RemoteError) {
        let code = error.code.as_str();
        if level == Level::ERROR {
            tracing::error!(code, status = ?error.status, "{}", message);
        } else if level == Level::WARN {
            tracing::warn!(code, status = ?error.status, "{}", message);
        } else {
            tracing::debug!(code, status = ?error.status, "{}", message);
        }
    }
}
