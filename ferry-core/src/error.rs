use std::path::PathBuf;

use thiserror::Error;

/// Cycle-level failures. A cycle that returns one of these moved nothing.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("source directory missing: {}", path.display())]
    DirectoryMissing { path: PathBuf },

    #[error("failed to list {}", path.display())]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single relocation. Recorded per item, never propagated out of
/// a worker.
#[derive(Error, Debug)]
pub enum MoveError {
    #[error("failed to copy {name} into {}", destination.display())]
    Copy {
        name: String,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The copy landed but the source could not be removed, so the file now
    /// exists in both directories.
    #[error("copied {name} but failed to remove it from {}", inbox.display())]
    Remove {
        name: String,
        inbox: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("move of {name} aborted: {reason}")]
    Aborted { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, TransferError>;
