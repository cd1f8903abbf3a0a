use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use configs::AppConfig;
use service::runtime;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::errors::StartupError;
use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    let raw = format!("{}:{}", cfg.server.host, cfg.server.port);
    raw.parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address {raw}: {e}")))
}

/// Ensure directories, open the configured storage backend and build the router.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    common::env::ensure_env(&cfg.storage.data_dir, &cfg.storage.uploads_dir).await?;
    let catalog = runtime::build_catalog(cfg).await?;
    Ok(routes::build_router(AppState { catalog }, build_cors()))
}

/// Serve until `shutdown` resolves.
pub async fn run(cfg: AppConfig, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;
    let addr = bind_addr(&cfg)?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, backend = ?cfg.storage.backend, "catalog server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("catalog server stopped");
    Ok(())
}

/// Resolves once `signal` fires. A signal that cannot be installed never
/// resolves, so the server keeps running instead of stopping at once.
pub async fn wait_for_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!(event = "shutdown_signal", "shutdown signal received"),
        Err(e) => {
            error!(event = "signal_handler_failed", error = %e, "cannot listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

/// Ctrl+C, see [`wait_for_signal`].
pub async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_rejects_hostnames() {
        let mut cfg = AppConfig::default();
        assert_eq!(bind_addr(&cfg).unwrap().port(), 4000);
        cfg.server.host = "not a host".into();
        assert!(matches!(bind_addr(&cfg), Err(StartupError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn failed_signal_handler_does_not_stop_the_server() {
        let failed = wait_for_signal(async { Err(std::io::Error::other("no signal handler")) });
        let waited = tokio::time::timeout(std::time::Duration::from_millis(50), failed).await;
        assert!(waited.is_err());

        let fired = wait_for_signal(async { Ok(()) });
        assert!(tokio::time::timeout(std::time::Duration::from_millis(50), fired).await.is_ok());
    }
}
