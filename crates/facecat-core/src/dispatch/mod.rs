//! Bounded batch dispatch.
//!
//! Drains a work queue with at most `max_concurrency` operations in flight.
//! Conflicts and throttling put the item back on the queue instead of
//! failing the batch; unprocessable input and other errors drop the item.

mod outcome;
mod queue;
mod report;
mod run;

pub use outcome::{classify_outcome, ItemOutcome};
pub use queue::WorkQueue;
pub use report::{DispatchReport, DroppedItem};
pub use run::Dispatcher;

use std::time::Duration;

use crate::config::DispatchConfig;
use crate::remote::ErrorCode;

/// How the pool refills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Start a new item as soon as any slot frees.
    #[default]
    SlidingWindow,
    /// Launch up to `max_concurrency` items, wait for all of them, repeat.
    Barrier,
}

/// Dispatcher tuning.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    /// Upper bound on in-flight operations (at least 1).
    pub max_concurrency: usize,
    pub mode: DispatchMode,
    /// Re-queued immediately.
    pub conflict_code: ErrorCode,
    /// Re-queued, and launching pauses for `rate_limit_pause`.
    pub rate_limit_code: ErrorCode,
    pub rate_limit_pause: Duration,
    /// Re-queues allowed per item before it is dropped. `None` = unlimited.
    pub max_requeues: Option<u32>,
    /// Time budget for one run of the per-item operation.
    pub item_timeout: Option<Duration>,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            mode: DispatchMode::SlidingWindow,
            conflict_code: ErrorCode::ConcurrentOperationConflict,
            rate_limit_code: ErrorCode::RateLimitExceeded,
            rate_limit_pause: Duration::from_millis(1000),
            max_requeues: Some(100),
            item_timeout: None,
        }
    }
}

impl DispatchPolicy {
    pub fn from_config(cfg: &DispatchConfig) -> Self {
        Self {
            max_concurrency: cfg.max_concurrency.max(1),
            mode: if cfg.barrier {
                DispatchMode::Barrier
            } else {
                DispatchMode::SlidingWindow
            },
            rate_limit_pause: Duration::from_millis(cfg.rate_limit_pause_ms),
            max_requeues: cfg.requeue_cap(),
            item_timeout: cfg.item_timeout_secs.map(Duration::from_secs),
            ..Self::default()
        }
    }
}
