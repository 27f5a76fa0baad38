//! Retry loop: run an async operation until success or the policy says stop.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::Level;

use crate::remote::RemoteError;

use super::error::RetryError;
use super::observer::{RetryObserver, TracingObserver};
use super::policy::{RetryDecision, RetryPolicy};

/// Optional collaborators for a retry run.
#[derive(Clone, Copy, Default)]
pub struct RetryHooks<'a> {
    pub observer: Option<&'a dyn RetryObserver>,
    pub cancel: Option<&'a CancellationToken>,
}

impl<'a> RetryHooks<'a> {
    /// No observer, no cancellation.
    pub fn none() -> Self {
        Self::default()
    }

    /// Log every failed attempt through `tracing`.
    pub fn traced() -> Self {
        Self {
            observer: Some(&TracingObserver),
            cancel: None,
        }
    }

    pub fn observer(mut self, observer: &'a dyn RetryObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn cancel(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Runs `op` until it succeeds or the retry policy says to stop.
///
/// Attempts are strictly sequential. On a transient failure the observer is
/// notified and the loop sleeps `retry_delay` without blocking the runtime.
/// Non-transient failures are returned on first occurrence; a transient
/// failure on attempt `max_retries + 1` is returned as `Exhausted`.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    hooks: RetryHooks<'_>,
    mut op: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let mut attempt = 1u32;
    loop {
        let result = match hooks.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(RetryError::Cancelled),
                r = attempt_once(policy, &mut op) => r,
            },
            None => attempt_once(policy, &mut op).await,
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let decision = policy.decide(attempt, &err);
        if let Some(observer) = hooks.observer {
            let (level, message) = describe(policy, attempt, decision, &err);
            observer.record(level, &message, &err);
        }

        match decision {
            RetryDecision::NoRetry => return Err(RetryError::Fatal(err)),
            RetryDecision::Exhausted => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                })
            }
            RetryDecision::RetryAfter(delay) => {
                match hooks.cancel {
                    Some(token) => tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(RetryError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    },
                    None => tokio::time::sleep(delay).await,
                }
                attempt += 1;
            }
        }
    }
}

/// Same as [`run_with_retry`] for operations with no result value
/// (e.g. triggering group training).
pub async fn run_void_with_retry<F, Fut>(
    policy: &RetryPolicy,
    hooks: RetryHooks<'_>,
    op: F,
) -> Result<(), RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), RemoteError>>,
{
    run_with_retry(policy, hooks, op).await
}

async fn attempt_once<T, F, Fut>(policy: &RetryPolicy, op: &mut F) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    match policy.attempt_timeout {
        Some(limit) => match tokio::time::timeout(limit, op()).await {
            Ok(r) => r,
            Err(_) => Err(RemoteError::timeout(limit)),
        },
        None => op().await,
    }
}

fn describe(
    policy: &RetryPolicy,
    attempt: u32,
    decision: RetryDecision,
    err: &RemoteError,
) -> (Level, String) {
    match decision {
        RetryDecision::RetryAfter(_) => (
            Level::WARN,
            format!(
                "Error: {}. Retrying {}/{}",
                err.message, attempt, policy.max_retries
            ),
        ),
        RetryDecision::Exhausted => (
            Level::ERROR,
            format!("Error: {}. Giving up after {} attempts", err.message, attempt),
        ),
        RetryDecision::NoRetry => (Level::ERROR, format!("Error: {}. Not retryable", err.message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::ErrorCode;
    use crate::retry::TransientCodes;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(Level, String)>>);

    impl RetryObserver for Recorder {
        fn record(&self, level: Level, message: &str, _error: &RemoteError) {
            self.0.lock().unwrap().push((level, message.to_string()));
        }
    }

    fn throttled() -> RemoteError {
        RemoteError::new(ErrorCode::RateLimitExceeded, "Rate limit is exceeded.")
    }

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            retry_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        }
    }

    #[tokio::test]
    async fn always_transient_runs_max_retries_plus_one() {
        for max_retries in [0u32, 1, 4] {
            let calls = AtomicU32::new(0);
            let res: Result<(), _> = run_with_retry(&fast(max_retries), RetryHooks::none(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(throttled()) }
            })
            .await;
            assert_eq!(calls.load(Ordering::SeqCst), max_retries + 1);
            match res {
                Err(RetryError::Exhausted { attempts, last }) => {
                    assert_eq!(attempts, max_retries + 1);
                    assert_eq!(last.code, ErrorCode::RateLimitExceeded);
                }
                other => panic!("expected exhaustion, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn fatal_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let res: Result<u8, _> = run_with_retry(&fast(10), RetryHooks::none(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(RemoteError::new(ErrorCode::LargePersonGroupNotFound, "missing")) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            res.unwrap_err().code(),
            Some(&ErrorCode::LargePersonGroupNotFound)
        );
    }

    #[tokio::test]
    async fn retry_then_succeed_returns_value() {
        let policy = RetryPolicy {
            max_retries: 3,
            retry_delay: Duration::from_millis(10),
            ..RetryPolicy::default()
        };
        let recorder = Recorder::default();
        let calls = AtomicU32::new(0);
        let started = Instant::now();
        let value = run_with_retry(&policy, RetryHooks::none().observer(&recorder), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(throttled())
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_millis(20));
        let records = recorder.0.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, Level::WARN);
        assert!(records[0].1.contains("Retrying 1/3"));
        assert!(records[1].1.contains("Retrying 2/3"));
    }

    #[tokio::test]
    async fn exhaustion_after_three_invocations() {
        let calls = AtomicU32::new(0);
        let recorder = Recorder::default();
        let res: Result<(), _> =
            run_with_retry(&fast(2), RetryHooks::none().observer(&recorder), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(throttled()) }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(res.unwrap_err().code(), Some(&ErrorCode::RateLimitExceeded));
        let records = recorder.0.lock().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].0, Level::ERROR);
    }

    #[tokio::test]
    async fn void_variant_retries_conflicts() {
        let calls = AtomicU32::new(0);
        run_void_with_retry(&fast(5), RetryHooks::none(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(RemoteError::new(ErrorCode::ConcurrentOperationConflict, "busy"))
                } else {
                    Ok(())
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn attempt_timeout_is_classified_by_caller() {
        let policy = RetryPolicy {
            transient: TransientCodes::none().with(ErrorCode::OperationTimeout),
            max_retries: 1,
            retry_delay: Duration::from_millis(1),
            attempt_timeout: Some(Duration::from_millis(10)),
        };
        let calls = AtomicU32::new(0);
        let res = run_with_retry(&policy, RetryHooks::none(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Ok::<_, RemoteError>(7)
            }
        })
        .await;
        assert_eq!(res.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancellation_abandons_retries() {
        let token = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy {
            max_retries: 60,
            retry_delay: Duration::from_secs(30),
            ..RetryPolicy::default()
        };
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let c = Arc::clone(&calls);
        let res: Result<(), _> = run_with_retry(&policy, RetryHooks::none().cancel(&token), || {
            c.fetch_add(1, Ordering::SeqCst);
            async { Err(throttled()) }
        })
        .await;
        assert_eq!(res.unwrap_err(), RetryError::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn already_cancelled_never_invokes() {
        let token = CancellationToken::new();
        token.cancel();
        let calls = AtomicU32::new(0);
        let res: Result<(), _> = run_with_retry(&fast(3), RetryHooks::none().cancel(&token), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;
        assert_eq!(res.unwrap_err(), RetryError::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
