//! Retry executor for face-service calls.
//!
//! Wraps a single async operation: transient failures (as classified by the
//! caller-supplied code set) are retried after a fixed, non-blocking delay
//! up to a bounded count; everything else is surfaced unchanged.

mod classify;
mod error;
mod observer;
mod policy;
mod run;

pub use classify::{is_unprocessable, Classification, TransientCodes};
pub use error::RetryError;
pub use observer::{RetryObserver, TracingObserver};
pub use policy::{RetryDecision, RetryPolicy};
pub use run::{run_void_with_retry, run_with_retry, RetryHooks};
