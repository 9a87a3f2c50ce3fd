use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::api::{AppState, router};
use crate::log_debug;

/// Serve the API on `bind` until Ctrl+C
pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let socket_addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Failed to parse socket address '{bind}'"))?;

    let listener = TcpListener::bind(socket_addr)
        .await
        .with_context(|| format!("Failed to bind {socket_addr}"))?;
    log_debug!("Negotiation API listening on {}", socket_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    log_debug!("Negotiation API shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        crate::log_warn!("Failed to listen for ctrl+c signal: {}", e);
        std::future::pending::<()>().await;
    }
    log_debug!("Interrupt signal received, shutting down");
}
