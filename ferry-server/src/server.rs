use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use ferry_config::Config;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::infra::{app_context::AppContext, startup::StartupHooks};
use crate::routes::create_app;

/// Run startup hooks, serve HTTP on `listener` until `signal` resolves, then
/// stop background work.
pub async fn run_with_hooks<H, F>(
    config: Config,
    listener: TcpListener,
    hooks: &H,
    signal: F,
) -> anyhow::Result<()>
where
    H: StartupHooks,
    F: Future<Output = ()> + Send + 'static,
{
    let context = Arc::new(AppContext::new(config));
    hooks
        .run(Arc::clone(&context))
        .await
        .context("startup hooks failed")?;

    let addr = listener.local_addr().context("listener has no local address")?;
    info!(%addr, "Starting Ferry import service (HTTP)");

    let token = context.shutdown_token();
    let served = axum::serve(listener, create_app())
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal => {}
                _ = token.cancelled() => {}
            }
        })
        .await
        .context("http server failed");

    info!("http server stopped; waiting for background work");
    context.shutdown().await;
    served
}

/// Resolves on Ctrl-C. Never resolves when the handler cannot be installed.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            error!(error = %err, "failed to listen for Ctrl-C; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
