use std::path::{Path, PathBuf};

use ferry_core::transfer::TransferConfig;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8010;
pub const DEFAULT_DATA_ROOT: &str = "./data";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub directories: DirectoryConfig,
    pub transfer: TransferConfig,
    pub metadata: ConfigMetadata,
}

impl Config {
    pub fn inbox_dir(&self) -> &Path {
        &self.directories.inbox
    }

    pub fn processed_dir(&self) -> &Path {
        &self.directories.processed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            directories: DirectoryConfig::under(DEFAULT_DATA_ROOT),
            transfer: TransferConfig::default(),
            metadata: ConfigMetadata::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// `host:port`, suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    pub data_root: PathBuf,
    /// Swept every cycle. Never created by the service.
    pub inbox: PathBuf,
    pub processed: PathBuf,
}

impl DirectoryConfig {
    /// Layout with `inbox/` and `processed/` beneath `root`.
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let data_root = root.into();
        Self {
            inbox: data_root.join("inbox"),
            processed: data_root.join("processed"),
            data_root,
        }
    }

    pub fn ensure_processed(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.processed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_lives_under_data() {
        let config = Config::default();
        assert_eq!(config.inbox_dir(), Path::new("./data/inbox"));
        assert_eq!(config.processed_dir(), Path::new("./data/processed"));
        assert_eq!(config.server.bind_addr(), "localhost:8010");
    }
}
