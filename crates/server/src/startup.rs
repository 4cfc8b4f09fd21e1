use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use configs::{AppConfig, ServerConfig};
use service::runtime::BarrelRuntime;

use crate::errors::StartupError;
use crate::routes;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(server: &ServerConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address {}:{}: {e}", server.host, server.port)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}

/// Serve the admin API on `listener` until `shutdown` resolves, then persist
/// the registry.
pub async fn serve<F>(runtime: Arc<BarrelRuntime>, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app: Router = routes::build_router(Arc::clone(&runtime), build_cors());
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    match runtime.shutdown().await {
        Ok(Some(saved)) => info!(saved, "barrels persisted on shutdown"),
        Ok(None) => warn!("barrels not persisted on shutdown"),
        Err(e) => error!(error = %e, "failed to persist barrels on shutdown"),
    }
    Ok(())
}

/// Public entry: load barrels, run the HTTP server, save on Ctrl+C
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    common::env::ensure_data_dir(&cfg.storage.data_dir)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let runtime = Arc::new(BarrelRuntime::from_config(&cfg));
    // a failed load is already logged; keep serving with whatever is registered
    if let Ok(count) = runtime.start().await {
        info!(count, file = %cfg.data_file().display(), "barrel registry ready");
    }

    let addr = bind_addr(&cfg.server)?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| StartupError::Runtime(format!("cannot bind {addr}: {e}")))?;
    info!(%addr, "starting barrel admin server");

    serve(runtime, listener, shutdown_signal()).await?;
    Ok(())
}
