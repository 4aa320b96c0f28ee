use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::mover::{Mover, WorkItem};
use super::queue::WorkQueue;
use crate::error::MoveError;

/// One item the pool gave up on. The source file may or may not still be in
/// the inbox depending on which step failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedMove {
    pub name: String,
    pub error: String,
}

/// Totals gathered by the workers of one pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub moved: usize,
    pub failed: usize,
    pub failures: Vec<FailedMove>,
}

#[derive(Default)]
struct PoolTally {
    moved: AtomicUsize,
    failures: Mutex<Vec<FailedMove>>,
}

impl PoolTally {
    fn summary(&self) -> PoolSummary {
        let failures = self.failures.lock().clone();
        PoolSummary {
            moved: self.moved.load(Ordering::Acquire),
            failed: failures.len(),
            failures,
        }
    }
}

/// Marks the popped item done when dropped, whatever path the worker takes
/// out of the move.
struct Completion<'a>(&'a WorkQueue<WorkItem>);

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.0.mark_done();
    }
}

/// Fixed set of consumers draining a shared [`WorkQueue`].
///
/// Workers loop until cancelled. Shutdown is two-phase: wait for the queue's
/// pending-count to reach zero, then cancel and await every worker.
pub struct WorkerPool {
    queue: Arc<WorkQueue<WorkItem>>,
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<()>>,
    tally: Arc<PoolTally>,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.handles.len())
            .field("pending", &self.queue.pending())
            .field("moved", &self.tally.moved.load(Ordering::Relaxed))
            .field("shutdown_cancelled", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl WorkerPool {
    /// Start `size` workers (at least one) pulling from `queue`.
    pub fn spawn(size: usize, queue: Arc<WorkQueue<WorkItem>>, mover: Arc<dyn Mover>) -> Self {
        let shutdown = CancellationToken::new();
        let tally = Arc::new(PoolTally::default());

        let handles = (0..size.max(1))
            .map(|i| {
                let worker_id = format!("transfer-w{i}");
                let queue = Arc::clone(&queue);
                let mover = Arc::clone(&mover);
                let tally = Arc::clone(&tally);
                let shutdown = shutdown.clone();

                tokio::spawn(async move {
                    loop {
                        let item = tokio::select! {
                            biased;
                            _ = shutdown.cancelled() => {
                                tracing::debug!(target: "transfer::worker", worker = %worker_id, "worker shutting down");
                                break;
                            }
                            item = queue.pop() => item,
                        };

                        let _done = Completion(&queue);
                        info!(target: "transfer::worker", worker = %worker_id, file = %item, "processing file");

                        // A panicking mover fails its item; the worker keeps draining.
                        let outcome = AssertUnwindSafe(mover.transfer(&item))
                            .catch_unwind()
                            .await
                            .unwrap_or_else(|payload| {
                                Err(MoveError::Aborted {
                                    name: item.display_name(),
                                    reason: panic_reason(payload.as_ref()),
                                })
                            });

                        match outcome {
                            Ok(()) => {
                                tally.moved.fetch_add(1, Ordering::AcqRel);
                                info!(target: "transfer::worker", worker = %worker_id, file = %item, "file moved");
                            }
                            Err(err) => {
                                warn!(target: "transfer::worker", worker = %worker_id, file = %item, error = %err, "move failed; dropping item");
                                tally.failures.lock().push(FailedMove {
                                    name: item.display_name(),
                                    error: err.to_string(),
                                });
                            }
                        }
                    }
                })
            })
            .collect();

        Self {
            queue,
            shutdown,
            handles,
            tally,
        }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Block until every enqueued item is handled, then stop all workers.
    ///
    /// Cancellation is only observed while a worker waits on the queue, never
    /// in the middle of a move.
    pub async fn drain_and_stop(self) -> PoolSummary {
        self.queue.join().await;
        self.shutdown.cancel();

        for result in futures::future::join_all(self.handles).await {
            if let Err(err) = result {
                warn!(target: "transfer::worker", error = %err, "worker task failed");
            }
        }

        self.tally.summary()
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("mover panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("mover panicked: {msg}")
    } else {
        "mover panicked".to_string()
    }
}
