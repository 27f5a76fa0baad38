//! Call sites that drive the face service over folders of images.
//!
//! Each batch runs through the [`Dispatcher`](crate::dispatch::Dispatcher);
//! single calls (person creation, detection per image) go through the retry
//! executor.

mod enroll;
mod files;
mod folder;

pub use enroll::{enroll_person, enroll_tree, EnrollSummary};
pub use files::{image_files, is_image_file};
pub use folder::{scan_folder, ScanSummary};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::dispatch::{DispatchPolicy, Dispatcher};
use crate::retry::{RetryHooks, RetryPolicy};
use crate::service::FaceService;

/// Everything a batch needs: the service, tuning, and a shared cancel token.
#[derive(Clone)]
pub struct BatchContext {
    pub service: Arc<dyn FaceService>,
    pub retry: RetryPolicy,
    pub dispatch: DispatchPolicy,
    pub cancel: CancellationToken,
}

impl BatchContext {
    pub fn new(service: Arc<dyn FaceService>, retry: RetryPolicy, dispatch: DispatchPolicy) -> Self {
        Self {
            service,
            retry,
            dispatch,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.dispatch.clone()).with_cancel(self.cancel.clone())
    }

    /// Traced retry hooks bound to this batch's cancel token.
    pub fn hooks(&self) -> RetryHooks<'_> {
        RetryHooks::traced().cancel(&self.cancel)
    }
}
