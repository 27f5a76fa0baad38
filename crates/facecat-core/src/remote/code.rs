//! Service error codes.

use std::fmt;

/// Error code as reported by the face service.
///
/// Codes the engine reasons about get their own variant; everything else
/// is kept verbatim in `Other` so nothing is lost on the way to the log.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    RateLimitExceeded,
    ConcurrentOperationConflict,
    LargePersonGroupNotFound,
    PersonNotFound,
    InvalidImage,
    /// Local per-attempt timeout fired before the service answered.
    OperationTimeout,
    /// Connection, DNS or TLS failure; no response was read.
    Transport,
    /// The caller's cancellation token fired.
    OperationCancelled,
    Unknown,
    Other(String),
}

impl ErrorCode {
    /// Parse a wire code. Unrecognised codes are preserved in `Other`.
    pub fn parse(s: &str) -> Self {
        match s {
            "RateLimitExceeded" => ErrorCode::RateLimitExceeded,
            "ConcurrentOperationConflict" => ErrorCode::ConcurrentOperationConflict,
            "LargePersonGroupNotFound" => ErrorCode::LargePersonGroupNotFound,
            "PersonNotFound" => ErrorCode::PersonNotFound,
            "InvalidImage" => ErrorCode::InvalidImage,
            "OperationTimeout" => ErrorCode::OperationTimeout,
            "Transport" => ErrorCode::Transport,
            "OperationCancelled" => ErrorCode::OperationCancelled,
            "Unknown" | "" => ErrorCode::Unknown,
            other => ErrorCode::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::RateLimitExceeded => "RateLimitExceeded",
            ErrorCode::ConcurrentOperationConflict => "ConcurrentOperationConflict",
            ErrorCode::LargePersonGroupNotFound => "LargePersonGroupNotFound",
            ErrorCode::PersonNotFound => "PersonNotFound",
            ErrorCode::InvalidImage => "InvalidImage",
            ErrorCode::OperationTimeout => "OperationTimeout",
            ErrorCode::Transport => "Transport",
            ErrorCode::OperationCancelled => "OperationCancelled",
            ErrorCode::Unknown => "Unknown",
            ErrorCode::Other(s) => s,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
