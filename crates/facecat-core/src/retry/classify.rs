//! Classify remote errors as transient or fatal.
//!
//! Classification depends only on the error code (plus a message match for
//! unprocessable input), never on attempt count or timing.

use std::collections::HashSet;

use crate::remote::{ErrorCode, RemoteError};

/// Outcome of classifying a single failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Expected to succeed if the identical call is repeated.
    Transient,
    /// Repeating the call will not help.
    Fatal,
}

/// Set of error codes a call site treats as retryable.
///
/// Supplied per call site: what is retryable depends on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientCodes(HashSet<ErrorCode>);

impl TransientCodes {
    /// Nothing is retried.
    pub fn none() -> Self {
        Self(HashSet::new())
    }

    /// Only service throttling is retried. Used when a dispatcher above
    /// already re-queues on conflict.
    pub fn rate_limit_only() -> Self {
        [ErrorCode::RateLimitExceeded].into_iter().collect()
    }

    /// Throttling and concurrent-operation conflicts.
    pub fn service_default() -> Self {
        [
            ErrorCode::RateLimitExceeded,
            ErrorCode::ConcurrentOperationConflict,
        ]
        .into_iter()
        .collect()
    }

    pub fn with(mut self, code: ErrorCode) -> Self {
        self.0.insert(code);
        self
    }

    pub fn contains(&self, code: &ErrorCode) -> bool {
        self.0.contains(code)
    }

    pub fn classify(&self, err: &RemoteError) -> Classification {
        if self.contains(&err.code) {
            Classification::Transient
        } else {
            Classification::Fatal
        }
    }
}

impl Default for TransientCodes {
    fn default() -> Self {
        Self::service_default()
    }
}

impl FromIterator<ErrorCode> for TransientCodes {
    fn from_iter<I: IntoIterator<Item = ErrorCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// True when the input itself cannot be processed (bad image, or more than
/// one face where exactly one is required). Never retried.
pub fn is_unprocessable(err: &RemoteError) -> bool {
    err.code == ErrorCode::InvalidImage
        || err.message.to_ascii_lowercase().contains("more than 1 face")
}
