//! Group training: trigger, then poll until the service reports a final state.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::remote::{ErrorCode, RemoteError};
use crate::retry::{run_void_with_retry, Classification, RetryError, RetryHooks, RetryPolicy};
use crate::service::{FaceService, TrainingStatus};

/// Consecutive non-transient poll failures after which waiting stops.
pub const MAX_POLL_FAILURES: u32 = 5;

/// Starts training `group` (retrying while the service rejects the request
/// transiently) and polls its status every `poll_interval` until it is no
/// longer running.
///
/// Errors while polling are logged and polling continues, unless
/// [`MAX_POLL_FAILURES`] non-transient errors arrive in a row (the group was
/// deleted, say); that last error is returned as `Fatal`. A failed trigger
/// or cancellation is returned to the caller.
pub async fn train_and_wait(
    service: &dyn FaceService,
    group: &str,
    retry: &RetryPolicy,
    poll_interval: Duration,
    cancel: Option<&CancellationToken>,
) -> Result<TrainingStatus, RetryError> {
    tracing::info!(group, "requesting training");
    let mut hooks = RetryHooks::traced();
    if let Some(token) = cancel {
        hooks = hooks.cancel(token);
    }
    run_void_with_retry(retry, hooks, || service.train_group(group)).await?;

    let mut failures = 0u32;
    loop {
        match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(RetryError::Cancelled),
                _ = tokio::time::sleep(poll_interval) => {}
            },
            None => tokio::time::sleep(poll_interval).await,
        }

        match service.training_status(group).await {
            Ok(status) => {
                failures = 0;
                tracing::info!(group, status = ?status.status, "training status");
                if status.status.is_finished() {
                    return Ok(status);
                }
            }
            Err(e) => {
                tracing::warn!(group, code = %e.code, "training status poll failed: {}", e.message);
                if poll_error_is_transient(retry, &e) {
                    failures = 0;
                    continue;
                }
                failures += 1;
                if failures >= MAX_POLL_FAILURES {
                    tracing::error!(group, failures, "giving up on training status");
                    return Err(RetryError::Fatal(e));
                }
            }
        }
    }
}

/// Throttling and connectivity problems never count towards the poll limit.
fn poll_error_is_transient(retry: &RetryPolicy, err: &RemoteError) -> bool {
    retry.transient.classify(err) == Classification::Transient
        || matches!(err.code, ErrorCode::Transport | ErrorCode::OperationTimeout)
}
