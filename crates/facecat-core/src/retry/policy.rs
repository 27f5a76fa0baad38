use std::time::Duration;

use crate::config::RetryConfig;
use crate::remote::RemoteError;

use super::classify::{Classification, TransientCodes};

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Not retryable; propagate now.
    NoRetry,
    /// Retryable, but the attempt budget is spent.
    Exhausted,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Fixed-delay retry policy.
///
/// At most `max_retries + 1` attempts are made.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Codes that trigger a retry.
    pub transient: TransientCodes,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay between attempts.
    pub retry_delay: Duration,
    /// Optional time budget for a single attempt.
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            transient: TransientCodes::default(),
            max_retries: 60,
            retry_delay: Duration::from_millis(1000),
            attempt_timeout: None,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            transient: TransientCodes::default(),
            max_retries: cfg.max_retries,
            retry_delay: Duration::from_millis(cfg.retry_delay_ms),
            attempt_timeout: cfg.attempt_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Same tuning, different transient set.
    pub fn with_transient(&self, transient: TransientCodes) -> Self {
        Self {
            transient,
            ..self.clone()
        }
    }

    /// Decide what to do after a failure.
    ///
    /// `attempt` is 1-based and counts the attempt that just failed.
    pub fn decide(&self, attempt: u32, err: &RemoteError) -> RetryDecision {
        if self.transient.classify(err) == Classification::Fatal {
            return RetryDecision::NoRetry;
        }
        if attempt > self.max_retries {
            return RetryDecision::Exhausted;
        }
        RetryDecision::RetryAfter(self.retry_delay)
    }
}
