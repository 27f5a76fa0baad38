//! Batch accounting.

use crate::remote::RemoteError;

use super::ItemOutcome;

/// An item the dispatcher gave up on.
#[derive(Debug, Clone)]
pub struct DroppedItem<I> {
    pub item: I,
    pub outcome: ItemOutcome,
    pub error: RemoteError,
}

/// Counters for one dispatcher run. Every dropped item is counted exactly once.
#[derive(Debug, Clone)]
pub struct DispatchReport<I> {
    pub completed: usize,
    pub requeued_conflict: usize,
    pub requeued_rate_limit: usize,
    pub unprocessable: usize,
    pub failed: usize,
    pub requeue_limited: usize,
    /// Items still pending when the run stopped on cancellation.
    pub cancelled: usize,
    /// Highest number of operations observed in flight at once.
    pub peak_in_flight: usize,
    pub dropped: Vec<DroppedItem<I>>,
}

impl<I> Default for DispatchReport<I> {
    fn default() -> Self {
        Self {
            completed: 0,
            requeued_conflict: 0,
            requeued_rate_limit: 0,
            unprocessable: 0,
            failed: 0,
            requeue_limited: 0,
            cancelled: 0,
            peak_in_flight: 0,
            dropped: Vec::new(),
        }
    }
}

impl<I> DispatchReport<I> {
    pub fn dropped_count(&self) -> usize {
        self.unprocessable + self.failed + self.requeue_limited
    }

    /// Items to surface as a warning at batch end: unprocessable input and
    /// items that ran out of re-queues.
    pub fn warning_tally(&self) -> usize {
        self.unprocessable + self.requeue_limited
    }

    pub(super) fn record_drop(&mut self, item: I, outcome: ItemOutcome, error: RemoteError) {
        match outcome {
            ItemOutcome::Unprocessable => self.unprocessable += 1,
            ItemOutcome::RequeueLimit => self.requeue_limited += 1,
            _ => self.failed += 1,
        }
        self.dropped.push(DroppedItem {
            item,
            outcome,
            error,
        });
    }
}
