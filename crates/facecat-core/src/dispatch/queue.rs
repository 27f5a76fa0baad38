//! Shared pending set for the dispatcher.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// An item waiting to be processed, with the number of times it has been
/// put back after a conflict or throttle.
#[derive(Debug, Clone)]
pub(super) struct Pending<I> {
    pub(super) item: I,
    pub(super) requeues: u32,
}

/// Thread-safe multiset of pending work items. Order is not significant.
///
/// Clones share the same storage, so a call site can keep adding items
/// while a dispatcher drains it.
#[derive(Debug)]
pub struct WorkQueue<I> {
    inner: Arc<Mutex<VecDeque<Pending<I>>>>,
}

impl<I> Clone for WorkQueue<I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I> Default for WorkQueue<I> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }
}

impl<I> WorkQueue<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, item: I) {
        self.lock().push_back(Pending { item, requeues: 0 });
    }

    /// Remove one item for processing.
    pub fn take(&self) -> Option<I> {
        self.take_pending().map(|p| p.item)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub(super) fn take_pending(&self) -> Option<Pending<I>> {
        self.lock().pop_front()
    }

    pub(super) fn requeue(&self, mut pending: Pending<I>) {
        pending.requeues += 1;
        self.lock().push_back(pending);
    }

    /// Return an item without charging it a re-queue (cancelled mid-flight).
    pub(super) fn restore(&self, pending: Pending<I>) {
        self.lock().push_back(pending);
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Pending<I>>> {
        // A panic while holding the lock cannot leave the deque half-updated.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<I> FromIterator<I> for WorkQueue<I> {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        let q = WorkQueue::new();
        for item in iter {
            q.push(item);
        }
        q
    }
}
