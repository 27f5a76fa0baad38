//! Per-item outcome classification.

use crate::remote::{ErrorCode, RemoteError};
use crate::retry::is_unprocessable;

use super::DispatchPolicy;

/// What happened to one run of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Completed,
    RequeuedAfterConflict,
    RequeuedAfterRateLimit,
    /// Input cannot be processed (e.g. more than one face). Dropped.
    Unprocessable,
    /// Any other error. Dropped.
    Failed,
    /// Conflict or throttle, but the item already used its re-queue budget.
    RequeueLimit,
    /// The operation observed cancellation; item goes back untouched.
    Cancelled,
}

impl ItemOutcome {
    /// `Completed` and the dropped outcomes are terminal.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ItemOutcome::Completed
                | ItemOutcome::Unprocessable
                | ItemOutcome::Failed
                | ItemOutcome::RequeueLimit
        )
    }

    pub fn is_dropped(self) -> bool {
        self.is_terminal() && self != ItemOutcome::Completed
    }
}

/// Classify an item's result. `requeues` is how many times the item has
/// already been put back.
pub fn classify_outcome<T>(
    policy: &DispatchPolicy,
    result: &Result<T, RemoteError>,
    requeues: u32,
) -> ItemOutcome {
    match result {
        Ok(_) => ItemOutcome::Completed,
        Err(e) => classify_error(policy, e, requeues),
    }
}

pub(super) fn classify_error(policy: &DispatchPolicy, err: &RemoteError, requeues: u32) -> ItemOutcome {
    let requeue = if err.code == policy.conflict_code {
        ItemOutcome::RequeuedAfterConflict
    } else if err.code == policy.rate_limit_code {
        ItemOutcome::RequeuedAfterRateLimit
    } else if err.code == ErrorCode::OperationCancelled {
        return ItemOutcome::Cancelled;
    } else if is_unprocessable(err) {
        return ItemOutcome::Unprocessable;
    } else {
        return ItemOutcome::Failed;
    };
    match policy.max_requeues {
        Some(max) if requeues >= max => ItemOutcome::RequeueLimit,
        _ => requeue,
    }
}
