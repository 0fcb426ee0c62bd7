//! Bounded FIFO of idle sessions

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use floodgate_core::Session;

/// Bounded FIFO with non-blocking insert and bounded-wait removal.
///
/// The pool swaps the whole queue out when it resizes, so the queue is
/// always used through an `Arc`; a reader that captured the old queue
/// keeps operating on a valid (if soon-to-be-retired) instance.
pub(crate) struct FreeQueue {
    bound: usize,
    items: Mutex<VecDeque<Arc<dyn Session>>>,
    notify: Notify,
    closed: AtomicBool,
}

impl FreeQueue {
    pub(crate) fn new(bound: usize) -> Self {
        Self {
            bound,
            items: Mutex::new(VecDeque::with_capacity(bound)),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Insert at the tail. Returns false when the queue is at its bound
    /// or has been closed.
    pub(crate) fn offer(&self, session: Arc<dyn Session>) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        {
            let mut items = self.items.lock();
            if items.len() >= self.bound {
                return false;
            }
            items.push_back(session);
        }
        self.notify.notify_one();
        true
    }

    /// Remove from the head without waiting.
    pub(crate) fn try_poll(&self) -> Option<Arc<dyn Session>> {
        self.items.lock().pop_front()
    }

    /// Remove from the head, waiting up to `timeout` for an item.
    ///
    /// Returns `None` once the timeout expires or the queue is closed.
    pub(crate) async fn poll(&self, timeout: Duration) -> Option<Arc<dyn Session>> {
        let deadline = Instant::now() + timeout;
        loop {
            // register interest before re-checking, or a concurrent
            // offer between the check and the await could be missed
            let notified = self.notify.notified();
            if let Some(session) = self.try_poll() {
                return Some(session);
            }
            if self.closed.load(Ordering::SeqCst) {
                return None;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.try_poll();
            }
        }
    }

    /// Remove everything currently queued.
    pub(crate) fn drain_all(&self) -> Vec<Arc<dyn Session>> {
        self.items.lock().drain(..).collect()
    }

    /// Reject further offers and wake every parked poller.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}
