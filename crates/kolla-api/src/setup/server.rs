//! Listener and graceful shutdown

use anyhow::{Context, Result};
use axum::Router;
use kolla_core::Config;
use std::net::SocketAddr;

pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port()));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        addr = %addr,
        public_base_url = config.public_base_url(),
        storage_backend = %config.storage_backend(),
        transcoding_provider = %config.transcoding().provider,
        max_video_mb = config.max_video_size_bytes() / 1024 / 1024,
        "Kolla API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated abnormally")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Waits for Ctrl+C, or SIGTERM on unix. In-flight requests finish first.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => tracing::info!("Ctrl+C received, draining"),
                    _ = sigterm.recv() => tracing::info!("SIGTERM received, draining"),
                }
                return;
            }
            Err(e) => tracing::warn!(error = %e, "SIGTERM handler unavailable"),
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Ctrl+C received, draining"),
        Err(e) => {
            tracing::error!(error = %e, "No shutdown signal handler could be installed");
            std::future::pending::<()>().await;
        }
    }
}
