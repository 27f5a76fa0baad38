//! Terminal failure of the retry executor.

use crate::remote::{ErrorCode, RemoteError};

/// Why a retried operation ultimately failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError {
    /// Non-transient failure; returned on first occurrence.
    #[error("{0}")]
    Fatal(RemoteError),
    /// Transient on every attempt until the retry budget ran out.
    #[error("{last} (gave up after {attempts} attempts)")]
    Exhausted { attempts: u32, last: RemoteError },
    /// The cancellation token fired before the operation finished.
    #[error("operation cancelled")]
    Cancelled,
}

impl RetryError {
    /// The last service error, if the failure came from the service.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            RetryError::Fatal(e) => Some(e),
            RetryError::Exhausted { last, .. } => Some(last),
            RetryError::Cancelled => None,
        }
    }

    pub fn code(&self) -> Option<&ErrorCode> {
        self.remote().map(|e| &e.code)
    }

    /// Collapse into the underlying service error so a dispatcher can apply
    /// its own re-queue rules; cancellation maps to `OperationCancelled`.
    pub fn into_remote(self) -> RemoteError {
        match self {
            RetryError::Fatal(e) => e,
            RetryError::Exhausted { last, .. } => last,
            RetryError::Cancelled => {
                RemoteError::new(ErrorCode::OperationCancelled, "operation cancelled")
            }
        }
    }
}
