//! Helpers for filling an inbox with fake CSV drops, so a local run has
//! something to move.
//!
//! Seeding is split into planning and applying: [`plan_seed`] only computes
//! paths, [`apply_seed`] touches the filesystem.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, TransferError};


/// Files written per series.
pub const DEFAULT_FILES_PER_SERIES: usize = 9;

/// Written when no seed file is supplied.
pub const SAMPLE_CSV: &str = "\
id,name,amount,created_at
1,alpha,12.50,2024-01-01T08:00:00Z
2,bravo,7.25,2024-01-01T08:05:00Z
3,charlie,19.00,2024-01-01T08:10:00Z
4,delta,3.75,2024-01-01T08:15:00Z
";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedOptions {
    /// Series number, rendered zero padded into every file name.
    pub series: u32,
    pub files: usize,
    /// File whose bytes every seeded file receives. Falls back to
    /// [`SAMPLE_CSV`] when unset.
    pub source: Option<PathBuf>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            series: 1,
            files: DEFAULT_FILES_PER_SERIES,
            source: None,
        }
    }
}

impl SeedOptions {
    pub fn for_series(series: u32) -> Self {
        Self {
            series,
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Paths a seed run will create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    pub inbox: PathBuf,
    pub files: Vec<PathBuf>,
}

/// `file_{series:02}_{index}.csv`
pub fn seed_file_name(series: u32, index: usize) -> String {
    format!("file_{series:02}_{index}.csv")
}

pub fn plan_seed(inbox: &Path, options: &SeedOptions) -> SeedPlan {
    SeedPlan {
        inbox: inbox.to_path_buf(),
        files: (0..options.files)
            .map(|index| inbox.join(seed_file_name(options.series, index)))
            .collect(),
    }
}

/// Create the inbox if needed and write every planned file, replacing
/// existing ones.
pub fn apply_seed(plan: &SeedPlan, contents: &[u8]) -> Result<()> {
    std::fs::create_dir_all(&plan.inbox).map_err(|err| {
        annotate(err, format!("failed to create inbox {}", plan.inbox.display()))
    })?;

    for file in &plan.files {
        std::fs::write(file, contents).map_err(|err| {
            annotate(err, format!("failed to write seed file {}", file.display()))
        })?;
    }
    Ok(())
}

/// Plan and apply in one go, returning the written paths.
pub fn seed_inbox(inbox: &Path, options: &SeedOptions) -> Result<Vec<PathBuf>> {
    let contents = match &options.source {
        Some(source) => std::fs::read(source).map_err(|err| {
            annotate(err, format!("failed to read seed source {}", source.display()))
        })?,
        None => SAMPLE_CSV.as_bytes().to_vec(),
    };

    let plan = plan_seed(inbox, options);
    apply_seed(&plan, &contents)?;

    info!(
        target: "seed",
        inbox = %inbox.display(),
        series = options.series,
        files = plan.files.len(),
        "seeded inbox"
    );
    Ok(plan.files)
}

fn annotate(err: io::Error, context: String) -> TransferError {
    TransferError::Io(io::Error::new(err.kind(), format!("{context}: {err}")))
}
