//! Errors reported by the remote face-recognition service.
//!
//! Every service call fails with a [`RemoteError`] carrying the service's
//! machine-readable code and message unaltered, so retry and dispatch
//! decisions can be made on the code alone.

mod code;
mod envelope;

pub use code::ErrorCode;

/// A failed call to the face service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RemoteError {
    /// Machine-readable error code (e.g. `RateLimitExceeded`).
    pub code: ErrorCode,
    /// Human-readable message as sent by the service.
    pub message: String,
    /// HTTP status, when the failure came from an HTTP response.
    pub status: Option<u32>,
}

impl RemoteError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u32) -> Self {
        self.status = Some(status);
        self
    }

    /// A single attempt exceeded its time budget.
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::new(
            ErrorCode::OperationTimeout,
            format!("operation timed out after {} ms", after.as_millis()),
        )
    }

    /// Network-level failure before any service response was read.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transport, message)
    }

    /// Build an error from a non-2xx response body.
    ///
    /// Accepts the wrapped `{"error": {...}}` envelope and the flat
    /// `{"code", "message"}` form; anything else maps to `Unknown`.
    pub fn from_response(status: u32, body: &str) -> Self {
        let (code, message) = envelope::parse(body).unwrap_or_else(|| {
            (ErrorCode::Unknown, "Unknown Error".to_string())
        });
        Self::new(code, message).with_status(status)
    }
}
