use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ferry_core::transfer::{CycleScheduler, ScanCycle};
use tracing::info;

use crate::infra::app_context::AppContext;

#[async_trait]
pub trait StartupHooks: Send + Sync {
    async fn run(&self, context: Arc<AppContext>) -> Result<()>;
}

/// Creates the processed directory and starts the scan scheduler.
#[derive(Debug, Default)]
pub struct ProdStartupHooks;

#[async_trait]
impl StartupHooks for ProdStartupHooks {
    async fn run(&self, context: Arc<AppContext>) -> Result<()> {
        let config = context.config();
        let directories = &config.directories;

        directories.ensure_processed().with_context(|| {
            format!(
                "failed to create processed directory {}",
                directories.processed.display()
            )
        })?;

        let cycle = ScanCycle::for_directories(
            &directories.inbox,
            &directories.processed,
            &config.transfer,
        );
        let scheduler = CycleScheduler::new(cycle, config.transfer.scan_interval());

        info!(
            inbox = %directories.inbox.display(),
            processed = %directories.processed.display(),
            interval_ms = config.transfer.scan_interval_ms,
            workers = config.transfer.workers(),
            "starting inbox scheduler"
        );
        context.track(tokio::spawn(scheduler.run(context.shutdown_token())));

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NoopStartupHooks;

#[async_trait]
impl StartupHooks for NoopStartupHooks {
    async fn run(&self, _context: Arc<AppContext>) -> Result<()> {
        Ok(())
    }
}
