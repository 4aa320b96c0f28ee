use std::fs;
use std::path::PathBuf;

use ferry_core::transfer::TransferConfig;
use thiserror::Error;

use super::{
    models::{
        Config, ConfigMetadata, DEFAULT_DATA_ROOT, DEFAULT_HOST, DEFAULT_PORT, DirectoryConfig,
        ServerConfig,
    },
    sources::{EnvConfig, FileConfig},
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] = ["ferry.toml", "config/ferry.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env`, read the process environment and compose the config.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigLoadError::MissingEnvFile { path: path.clone() });
                }
                dotenvy::from_path(path)?;
                true
            }
            // An absent default `.env` is normal.
            None => dotenvy::dotenv()
                .map(|_| true)
                .or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?,
        };

        self.compose(EnvConfig::gather(), env_file_loaded)
    }

    /// Compose from an already gathered environment, skipping `.env` files.
    pub fn load_with_env(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        self.compose(env, false)
    }

    fn compose(&self, env: EnvConfig, env_file_loaded: bool) -> Result<ConfigLoad, ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        let (file_config, config_path) = self.load_file_config(&env)?;
        if config_path.is_none() {
            warnings.push_with_hint(
                "No ferry.toml detected; using defaults and environment variables",
                "Create ferry.toml or pass --config to pin the settings",
            );
        }
        for rejected in &env.rejected {
            warnings.push(format!("ignoring unparsable environment value {rejected}"));
        }

        let FileConfig {
            server: file_server,
            directories: file_directories,
            transfer: file_transfer,
        } = file_config.unwrap_or_default();

        let server = ServerConfig {
            host: env
                .server_host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: env.server_port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let data_root = env
            .data_dir
            .clone()
            .or(file_directories.data)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_ROOT));
        let defaults = DirectoryConfig::under(&data_root);
        let directories = DirectoryConfig {
            inbox: env
                .inbox_dir
                .clone()
                .or(file_directories.inbox)
                .unwrap_or(defaults.inbox),
            processed: env
                .processed_dir
                .clone()
                .or(file_directories.processed)
                .unwrap_or(defaults.processed),
            data_root,
        };

        let transfer_defaults = TransferConfig::default();
        let transfer = TransferConfig {
            scan_interval_ms: env
                .scan_interval
                .map(duration_ms)
                .or(file_transfer.scan_interval_ms)
                .unwrap_or(transfer_defaults.scan_interval_ms),
            worker_count: env
                .worker_count
                .or(file_transfer.worker_count)
                .unwrap_or(transfer_defaults.worker_count),
            enqueue_delay_ms: env
                .enqueue_delay
                .map(duration_ms)
                .or(file_transfer.enqueue_delay_ms)
                .unwrap_or(transfer_defaults.enqueue_delay_ms),
        };

        let mut config = Config {
            server,
            directories,
            transfer,
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        };

        warnings.extend(validation::apply_guard_rails(&mut config)?);

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let mut source = ConfigPathSource::default();

        if let Some(explicit) = &self.options.config_path {
            source.explicit = Some(explicit.clone());
        } else if let Some(from_env) = &env.config_path {
            source.env = Some(from_env.clone());
        } else {
            source.default = DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists());
        }

        let Some((path, provenance)) = source.resolved_path() else {
            return Ok((None, None));
        };

        if !path.exists() {
            if provenance.is_explicit() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
            path: path.clone(),
            source,
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
                path: path.clone(),
                source,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

fn duration_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {}", path.display())]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error("env file missing: {}", path.display())]
    MissingEnvFile { path: PathBuf },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Default)]
struct ConfigPathSource {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    default: Option<PathBuf>,
}

impl ConfigPathSource {
    fn resolved_path(&self) -> Option<(PathBuf, ConfigPathProvenance)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigPathProvenance::Explicit));
        }
        if let Some(path) = &self.env {
            return Some((path.clone(), ConfigPathProvenance::Env));
        }
        if let Some(path) = &self.default {
            return Some((path.clone(), ConfigPathProvenance::Default));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigPathProvenance {
    Explicit,
    Env,
    Default,
}

impl ConfigPathProvenance {
    fn is_explicit(self) -> bool {
        matches!(self, ConfigPathProvenance::Explicit | ConfigPathProvenance::Env)
    }
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
