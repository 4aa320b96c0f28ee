use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use super::models::Config;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("scan interval must be greater than zero")]
    ZeroScanInterval,
    #[error("inbox and processed directories both resolve to {}", path.display())]
    SharedDirectory { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

/// Reject configurations the pipeline cannot run with and patch the ones it
/// can, reporting each patch as a warning.
pub fn apply_guard_rails(config: &mut Config) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.transfer.scan_interval_ms == 0 {
        return Err(ConfigGuardRailError::ZeroScanInterval);
    }

    if same_location(&config.directories.inbox, &config.directories.processed) {
        return Err(ConfigGuardRailError::SharedDirectory {
            path: config.directories.inbox.clone(),
        });
    }

    if config.transfer.worker_count == 0 {
        config.transfer.worker_count = 1;
        warnings.push_with_hint(
            "worker_count is 0; running cycles with a single worker",
            "Set FERRY_WORKERS or [transfer] worker_count to a positive number",
        );
    }

    if !config.directories.inbox.is_dir() {
        warnings.push_with_hint(
            format!(
                "inbox {} does not exist yet; cycles will fail until it is created",
                config.directories.inbox.display()
            ),
            "Create the directory or run `ferry-server seed 1` to populate it",
        );
    }

    Ok(warnings)
}

fn same_location(a: &Path, b: &Path) -> bool {
    if let (Ok(a), Ok(b)) = (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        return a == b;
    }
    lexical(a) == lexical(b)
}

fn lexical(path: &Path) -> Vec<Component<'_>> {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}
