use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub directories: FileDirectoryConfig,
    #[serde(default)]
    pub transfer: FileTransferConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDirectoryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbox: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileTransferConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enqueue_delay_ms: Option<u64>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub inbox_dir: Option<PathBuf>,
    pub processed_dir: Option<PathBuf>,
    pub scan_interval: Option<Duration>,
    pub worker_count: Option<usize>,
    pub enqueue_delay: Option<Duration>,
    /// Variables that were set but could not be parsed, as `NAME=value`.
    pub rejected: Vec<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut env_config = Self::default();

        let rejected = &mut env_config.rejected;

        let server_port = parse_var(&get, "SERVER_PORT", |raw| raw.parse().ok(), rejected);
        let scan_interval = parse_var(&get, "FERRY_SCAN_INTERVAL", parse_duration, rejected);
        let worker_count = parse_var(&get, "FERRY_WORKERS", |raw| raw.parse().ok(), rejected);
        let enqueue_delay = parse_var(&get, "FERRY_ENQUEUE_DELAY", parse_duration, rejected);

        env_config.config_path = get("FERRY_CONFIG").map(PathBuf::from);
        env_config.server_host = get("SERVER_HOST");
        env_config.server_port = server_port;

        env_config.data_dir = get("FERRY_DATA_DIR").map(PathBuf::from);
        env_config.inbox_dir = get("FERRY_INBOX_DIR").map(PathBuf::from);
        env_config.processed_dir = get("FERRY_PROCESSED_DIR").map(PathBuf::from);

        env_config.scan_interval = scan_interval;
        env_config.worker_count = worker_count;
        env_config.enqueue_delay = enqueue_delay;

        env_config
    }
}

fn parse_var<T>(
    get: &impl Fn(&str) -> Option<String>,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
    rejected: &mut Vec<String>,
) -> Option<T> {
    let raw = get(name)?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        rejected.push(format!("{name}={raw}"));
    }
    parsed
}

/// Accepts humantime strings (`5s`, `250ms`) or a bare millisecond count.
fn parse_duration(raw: &str) -> Option<Duration> {
    if let Ok(ms) = raw.parse::<u64>() {
        return Some(Duration::from_millis(ms));
    }
    humantime::parse_duration(raw).ok()
}
