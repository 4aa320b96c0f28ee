use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::config::TransferConfig;
use super::mover::{FsMover, Mover, WorkItem};
use super::pool::{FailedMove, WorkerPool};
use super::queue::WorkQueue;
use crate::error::{Result, TransferError};

/// Source of pending work for a cycle.
#[async_trait]
pub trait Inbox: Send + Sync {
    /// Human readable location, used in logs.
    fn location(&self) -> String;

    async fn list(&self) -> Result<Vec<WorkItem>>;
}

/// Non-recursive listing of regular files in a directory.
#[derive(Clone, Debug)]
pub struct FsInbox {
    root: PathBuf,
}

impl FsInbox {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Inbox for FsInbox {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    async fn list(&self) -> Result<Vec<WorkItem>> {
        let listing_error = |source: std::io::Error| match source.kind() {
            ErrorKind::NotFound => TransferError::DirectoryMissing {
                path: self.root.clone(),
            },
            _ => TransferError::Listing {
                path: self.root.clone(),
                source,
            },
        };

        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(listing_error)?;
        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(listing_error)? {
            // Follows symlinks. Entries that vanish between listing and stat,
            // and dangling links, are skipped.
            let Ok(metadata) = tokio::fs::metadata(entry.path()).await else {
                continue;
            };
            if !metadata.is_file() {
                debug!(target: "transfer::cycle", entry = %entry.path().display(), "skipping non-file inbox entry");
                continue;
            }
            items.push(WorkItem::new(entry.file_name()));
        }
        Ok(items)
    }
}

/// Outcome of one scan-enqueue-drain pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub enqueued: usize,
    pub moved: usize,
    pub failed: usize,
    pub failures: Vec<FailedMove>,
}

impl CycleReport {
    /// Items relocated successfully.
    pub fn processed(&self) -> usize {
        self.moved
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Per-cycle tuning derived from [`TransferConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleSettings {
    pub workers: usize,
    pub enqueue_delay: Duration,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self::from(&TransferConfig::default())
    }
}

impl From<&TransferConfig> for CycleSettings {
    fn from(cfg: &TransferConfig) -> Self {
        Self {
            workers: cfg.workers(),
            enqueue_delay: cfg.enqueue_delay(),
        }
    }
}

/// Lists the inbox, queues every entry and drains the queue through a fresh
/// [`WorkerPool`].
///
/// Each run owns its own queue, so concurrent runs never share state; the
/// scheduler still keeps them from overlapping on the same directories.
pub struct ScanCycle {
    inbox: Arc<dyn Inbox>,
    mover: Arc<dyn Mover>,
    settings: CycleSettings,
}

impl fmt::Debug for ScanCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanCycle")
            .field("inbox", &self.inbox.location())
            .field("settings", &self.settings)
            .finish()
    }
}

impl ScanCycle {
    pub fn new(inbox: Arc<dyn Inbox>, mover: Arc<dyn Mover>, settings: CycleSettings) -> Self {
        Self {
            inbox,
            mover,
            settings,
        }
    }

    /// Wire a cycle moving files between two directories.
    pub fn for_directories(
        inbox: impl Into<PathBuf>,
        processed: impl Into<PathBuf>,
        config: &TransferConfig,
    ) -> Self {
        let inbox = inbox.into();
        Self::new(
            Arc::new(FsInbox::new(inbox.clone())),
            Arc::new(FsMover::new(inbox, processed)),
            CycleSettings::from(config),
        )
    }

    pub fn settings(&self) -> CycleSettings {
        self.settings
    }

    pub async fn run(&self) -> Result<CycleReport> {
        let cycle_id = Uuid::now_v7();
        let started_at = Utc::now();
        info!(target: "transfer::cycle", cycle = %cycle_id, inbox = %self.inbox.location(), "checking inbox for files to process");

        let items = self.inbox.list().await?;
        let enqueued = items.len();

        let queue = Arc::new(WorkQueue::new());
        for item in items {
            if !self.settings.enqueue_delay.is_zero() {
                tokio::time::sleep(self.settings.enqueue_delay).await;
            }
            debug!(target: "transfer::cycle", cycle = %cycle_id, file = %item, "queueing file");
            queue.push(item);
        }
        info!(target: "transfer::cycle", cycle = %cycle_id, enqueued, "inbox listing queued");

        let pool = WorkerPool::spawn(self.settings.workers, Arc::clone(&queue), Arc::clone(&self.mover));
        let summary = pool.drain_and_stop().await;

        let report = CycleReport {
            cycle_id,
            started_at,
            finished_at: Utc::now(),
            enqueued,
            moved: summary.moved,
            failed: summary.failed,
            failures: summary.failures,
        };
        info!(
            target: "transfer::cycle",
            cycle = %cycle_id,
            enqueued = report.enqueued,
            moved = report.moved,
            failed = report.failed,
            "cycle drained"
        );
        Ok(report)
    }
}
