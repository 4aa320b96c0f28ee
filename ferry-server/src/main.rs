//! # Ferry Server
//!
//! Sweeps `./data/inbox` into `./data/processed` every few seconds and answers
//! `GET /` with a liveness message.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use ferry_config::{Config, ConfigLoad, ConfigLoader, ConfigLoaderOptions};
use ferry_core::demo::{DEFAULT_FILES_PER_SERIES, SeedOptions, seed_inbox};
use ferry_server::{
    infra::{
        startup::{ProdStartupHooks, StartupHooks},
        telemetry::init_tracing,
    },
    server::{run_with_hooks, shutdown_signal},
};
use tracing::{info, warn};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "ferry-server")]
#[command(about = "Scheduled inbox sweeper with a liveness endpoint")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Path to ferry.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Drop a series of fake CSV files into the inbox and exit
    Seed(SeedArgs),
}

#[derive(ClapArgs, Debug, Clone)]
struct SeedArgs {
    /// Series number used in the generated file names
    series: u32,

    /// File to copy into every seeded file (defaults to a built-in sample)
    #[arg(long)]
    from: Option<PathBuf>,

    /// Target directory (defaults to the configured inbox)
    #[arg(long)]
    inbox: Option<PathBuf>,

    /// Number of files to write
    #[arg(long, default_value_t = DEFAULT_FILES_PER_SERIES)]
    count: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_runtime_config(&cli.serve)?;

    if let Some(command) = cli.command {
        match command {
            Command::Seed(args) => {
                run_seed(&config, args)?;
                return Ok(());
            }
        }
    }

    run_server(config).await
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let loader = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: args.config.clone(),
        env_file: args.env_file.clone(),
    });

    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    init_tracing();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "loaded configuration file");
    }

    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => {
                warn!(message = %warning.message, "configuration warning")
            }
        }
    }

    Ok(config)
}

fn run_seed(config: &Config, args: SeedArgs) -> anyhow::Result<()> {
    let inbox = args
        .inbox
        .unwrap_or_else(|| config.directories.inbox.clone());
    let options = SeedOptions {
        series: args.series,
        files: args.count,
        source: args.from,
    };

    let written = seed_inbox(&inbox, &options)
        .with_context(|| format!("failed to seed {}", inbox.display()))?;
    for path in &written {
        info!(target: "seed", file = %path.display(), "created");
    }
    Ok(())
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    run_server_with_hooks(config, &ProdStartupHooks).await
}

async fn run_server_with_hooks<H>(config: Config, hooks: &H) -> anyhow::Result<()>
where
    H: StartupHooks,
{
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    run_with_hooks(config, listener, hooks, shutdown_signal()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_subcommand_parses_series_and_source() {
        let cli = Cli::try_parse_from(["ferry-server", "seed", "3", "--from", "data/example.csv"])
            .expect("valid args");
        let Some(Command::Seed(args)) = cli.command else {
            panic!("seed subcommand expected");
        };
        assert_eq!(args.series, 3);
        assert_eq!(args.from, Some(PathBuf::from("data/example.csv")));
        assert_eq!(args.count, DEFAULT_FILES_PER_SERIES);
    }

    #[test]
    fn serve_flags_are_optional() {
        let cli = Cli::try_parse_from(["ferry-server", "--port", "9000"]).expect("valid args");
        assert!(cli.command.is_none());
        assert_eq!(cli.serve.port, Some(9000));
        assert!(cli.serve.host.is_none());
    }

    #[test]
    fn seed_requires_a_series() {
        assert!(Cli::try_parse_from(["ferry-server", "seed"]).is_err());
    }
}
