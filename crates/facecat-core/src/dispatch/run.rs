//! Worker pool: drain the queue with bounded concurrency.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::task::{Id, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Level;

use crate::remote::{ErrorCode, RemoteError};
use crate::retry::{RetryObserver, TracingObserver};

use super::outcome::{classify_error, ItemOutcome};
use super::queue::{Pending, WorkQueue};
use super::report::DispatchReport;
use super::{DispatchMode, DispatchPolicy};

/// Applies a per-item operation across a [`WorkQueue`] with at most
/// `max_concurrency` operations in flight.
#[derive(Clone)]
pub struct Dispatcher {
    policy: DispatchPolicy,
    cancel: Option<CancellationToken>,
    observer: Arc<dyn RetryObserver>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("policy", &self.policy)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatchPolicy::default())
    }
}

impl Dispatcher {
    pub fn new(policy: DispatchPolicy) -> Self {
        Self {
            policy,
            cancel: None,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Stop launching new items once `token` is cancelled.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Receives one record per re-queue and per dropped item.
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    /// Drains `queue`, calling `on_success` exactly once per completed item.
    ///
    /// Never fails: every per-item error ends up re-queued or dropped and
    /// counted in the returned report. A panicking operation is dropped as
    /// `Failed`. Returns once the queue is empty and nothing is in flight,
    /// or after cancellation once in-flight work has finished (unstarted
    /// items stay in the queue).
    pub async fn run<I, T, F, Fut, S>(
        &self,
        queue: &WorkQueue<I>,
        op: F,
        mut on_success: S,
    ) -> DispatchReport<I>
    where
        I: Clone + Send + fmt::Debug + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
        S: FnMut(&I, T),
    {
        let max = self.policy.max_concurrency.max(1);
        let mut report = DispatchReport::default();
        let mut in_flight: JoinSet<Result<T, RemoteError>> = JoinSet::new();
        let mut launched: HashMap<Id, Pending<I>> = HashMap::new();
        let mut paused_until: Option<Instant> = None;
        let mut stopping = false;

        loop {
            stopping = stopping || self.is_cancelled();
            let may_launch = match self.policy.mode {
                DispatchMode::SlidingWindow => true,
                DispatchMode::Barrier => in_flight.is_empty(),
            };

            if may_launch && !stopping && !queue.is_empty() && in_flight.len() < max {
                if let Some(until) = paused_until.take() {
                    if !self.pause_until(until).await {
                        stopping = true;
                    }
                }
            }

            while may_launch && !stopping && in_flight.len() < max {
                let Some(pending) = queue.take_pending() else {
                    break;
                };
                let fut = op(pending.item.clone());
                let limit = self.policy.item_timeout;
                let handle = in_flight.spawn(async move {
                    match limit {
                        Some(d) => match tokio::time::timeout(d, fut).await {
                            Ok(r) => r,
                            Err(_) => Err(RemoteError::timeout(d)),
                        },
                        None => fut.await,
                    }
                });
                launched.insert(handle.id(), pending);
                report.peak_in_flight = report.peak_in_flight.max(in_flight.len());
            }

            let Some(joined) = in_flight.join_next_with_id().await else {
                break;
            };
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(e) => {
                    let err =
                        RemoteError::new(ErrorCode::Other("TaskPanicked".into()), e.to_string());
                    match launched.remove(&e.id()) {
                        Some(pending) => {
                            self.observer.record(
                                Level::ERROR,
                                &format!("{:?}: operation aborted, dropping item", pending.item),
                                &err,
                            );
                            report.record_drop(pending.item, ItemOutcome::Failed, err);
                        }
                        None => report.failed += 1,
                    }
                    continue;
                }
            };
            let Some(pending) = launched.remove(&id) else {
                continue;
            };

            let err = match result {
                Ok(value) => {
                    report.completed += 1;
                    on_success(&pending.item, value);
                    continue;
                }
                Err(err) => err,
            };

            match classify_error(&self.policy, &err, pending.requeues) {
                ItemOutcome::RequeuedAfterConflict => {
                    self.observer.record(
                        Level::DEBUG,
                        &format!("{:?}: concurrent operation conflict, re-queuing", pending.item),
                        &err,
                    );
                    report.requeued_conflict += 1;
                    queue.requeue(pending);
                }
                ItemOutcome::RequeuedAfterRateLimit => {
                    self.observer.record(
                        Level::INFO,
                        &format!(
                            "{:?}: rate limit exceeded, re-queuing in {} ms",
                            pending.item,
                            self.policy.rate_limit_pause.as_millis()
                        ),
                        &err,
                    );
                    report.requeued_rate_limit += 1;
                    queue.requeue(pending);
                    paused_until = Some(Instant::now() + self.policy.rate_limit_pause);
                }
                ItemOutcome::Cancelled => {
                    stopping = true;
                    queue.restore(pending);
                }
                outcome => {
                    let (level, message) = match outcome {
                        ItemOutcome::Unprocessable => (
                            Level::WARN,
                            format!("{:?}: unprocessable input: {}", pending.item, err.message),
                        ),
                        ItemOutcome::RequeueLimit => (
                            Level::WARN,
                            format!(
                                "{:?}: permanently failed after {} re-queues",
                                pending.item, pending.requeues
                            ),
                        ),
                        _ => (
                            Level::ERROR,
                            format!("{:?}: dropping item: {}", pending.item, err.message),
                        ),
                    };
                    self.observer.record(level, &message, &err);
                    report.record_drop(pending.item, outcome, err);
                }
            }
        }

        if stopping {
            report.cancelled = queue.len();
        }
        tracing::info!(
            completed = report.completed,
            dropped = report.dropped_count(),
            warnings = report.warning_tally(),
            cancelled = report.cancelled,
            "dispatch finished"
        );
        report
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Sleep until `until`; returns false if cancelled first.
    async fn pause_until(&self, until: Instant) -> bool {
        match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => false,
                _ = tokio::time::sleep_until(until) => true,
            },
            None => {
                tokio::time::sleep_until(until).await;
                true
            }
        }
    }
}
