use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use tokio::sync::{Notify, watch};

/// Unbounded work queue with a completion latch.
///
/// Producers `push` without blocking, consumers `pop` and later `mark_done`.
/// The pending-count tracks items pushed but not yet marked done; `join`
/// resolves once it reaches zero. Delivery is FIFO but callers must not rely
/// on completion order.
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Notify,
    pending: watch::Sender<usize>,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for WorkQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkQueue")
            .field("queued", &self.len())
            .field("pending", &self.pending())
            .finish()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        let (pending, _) = watch::channel(0);
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Notify::new(),
            pending,
        }
    }

    pub fn push(&self, item: T) {
        self.pending.send_modify(|count| *count += 1);
        self.items.lock().push_back(item);
        self.available.notify_one();
    }

    /// Wait until an item is available and take it.
    ///
    /// Cancel-safe: an item is only removed from the queue in the same poll
    /// that returns it.
    pub async fn pop(&self) -> T {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next = self.items.lock().pop_front();
            if let Some(item) = next {
                return item;
            }

            notified.await;
        }
    }

    /// Record that a previously popped item is fully handled.
    pub fn mark_done(&self) {
        let mut underflow = false;
        self.pending.send_modify(|count| match count.checked_sub(1) {
            Some(next) => *count = next,
            None => underflow = true,
        });
        if underflow {
            tracing::warn!(target: "transfer::queue", "mark_done called more times than items were pushed");
        }
    }

    /// Items pushed but not yet marked done.
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Items waiting to be popped.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until every pushed item has been popped and marked done.
    pub async fn join(&self) {
        let mut rx = self.pending.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}
