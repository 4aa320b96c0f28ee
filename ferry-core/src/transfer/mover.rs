use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::MoveError;

/// Name of one pending inbox entry, relative to the inbox directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorkItem(OsString);

impl WorkItem {
    pub fn new(name: impl Into<OsString>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &OsStr {
        &self.0
    }

    pub fn display_name(&self) -> String {
        self.0.to_string_lossy().into_owned()
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_string_lossy())
    }
}

/// Relocates a single inbox entry. Implementations report failure through the
/// returned result; logging belongs to the caller.
#[async_trait]
pub trait Mover: Send + Sync {
    async fn transfer(&self, item: &WorkItem) -> Result<(), MoveError>;
}

/// Copies `inbox/<name>` into the processed directory, then deletes the
/// source.
///
/// The two steps are not atomic: when the copy succeeds and the delete fails
/// the file is left in both directories and `MoveError::Remove` is returned.
#[derive(Clone, Debug)]
pub struct FsMover {
    inbox: PathBuf,
    processed: PathBuf,
}

impl FsMover {
    pub fn new(inbox: impl Into<PathBuf>, processed: impl Into<PathBuf>) -> Self {
        Self {
            inbox: inbox.into(),
            processed: processed.into(),
        }
    }

    pub fn inbox(&self) -> &Path {
        &self.inbox
    }

    pub fn processed(&self) -> &Path {
        &self.processed
    }
}

#[async_trait]
impl Mover for FsMover {
    async fn transfer(&self, item: &WorkItem) -> Result<(), MoveError> {
        let from = self.inbox.join(item.name());
        let to = self.processed.join(item.name());
        let inbox = self.inbox.clone();
        let processed = self.processed.clone();
        let name = item.display_name();

        // copy/remove are blocking syscalls; keep them off the runtime workers.
        tokio::task::spawn_blocking(move || {
            std::fs::copy(&from, &to).map_err(|source| MoveError::Copy {
                name: name.clone(),
                destination: processed,
                source,
            })?;
            std::fs::remove_file(&from).map_err(|source| MoveError::Remove {
                name,
                inbox,
                source,
            })
        })
        .await
        .map_err(|join_err| MoveError::Aborted {
            name: item.display_name(),
            reason: join_err.to_string(),
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn transfer_relocates_bytes_and_clears_the_inbox() {
        let tmp = tempdir().expect("tempdir");
        let inbox = tmp.path().join("inbox");
        let processed = tmp.path().join("processed");
        std::fs::create_dir_all(&inbox).expect("inbox");
        std::fs::create_dir_all(&processed).expect("processed");
        std::fs::write(inbox.join("a.csv"), b"id,name\n1,alpha\n").expect("seed");

        let mover = FsMover::new(&inbox, &processed);
        mover
            .transfer(&WorkItem::new("a.csv"))
            .await
            .expect("move succeeds");

        assert!(!inbox.join("a.csv").exists());
        let moved = std::fs::read(processed.join("a.csv")).expect("moved file");
        assert_eq!(moved, b"id,name\n1,alpha\n");
    }

    #[tokio::test]
    async fn transfer_overwrites_an_existing_destination() {
        let tmp = tempdir().expect("tempdir");
        let inbox = tmp.path().join("inbox");
        let processed = tmp.path().join("processed");
        std::fs::create_dir_all(&inbox).expect("inbox");
        std::fs::create_dir_all(&processed).expect("processed");
        std::fs::write(inbox.join("a.csv"), b"new").expect("seed");
        std::fs::write(processed.join("a.csv"), b"old").expect("stale copy");

        FsMover::new(&inbox, &processed)
            .transfer(&WorkItem::new("a.csv"))
            .await
            .expect("move succeeds");

        assert_eq!(std::fs::read(processed.join("a.csv")).expect("read"), b"new");
    }

    #[tokio::test]
    async fn missing_source_fails_at_the_copy_step() {
        let tmp = tempdir().expect("tempdir");
        let processed = tmp.path().join("processed");
        std::fs::create_dir_all(&processed).expect("processed");

        let err = FsMover::new(tmp.path().join("inbox"), &processed)
            .transfer(&WorkItem::new("ghost.csv"))
            .await
            .expect_err("nothing to move");

        assert!(matches!(err, MoveError::Copy { ref name, .. } if name == "ghost.csv"));
        assert_eq!(std::fs::read_dir(&processed).expect("read").count(), 0);
    }

    #[tokio::test]
    async fn missing_destination_directory_keeps_the_source() {
        let tmp = tempdir().expect("tempdir");
        let inbox = tmp.path().join("inbox");
        std::fs::create_dir_all(&inbox).expect("inbox");
        std::fs::write(inbox.join("b.csv"), b"payload").expect("seed");

        let err = FsMover::new(&inbox, tmp.path().join("nope"))
            .transfer(&WorkItem::new("b.csv"))
            .await
            .expect_err("destination missing");

        assert!(matches!(err, MoveError::Copy { .. }));
        assert!(inbox.join("b.csv").exists());
    }
}
