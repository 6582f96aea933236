//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};
use kolla_core::Config;

use crate::state::AppState;

/// Validate configuration, start telemetry and wire every component.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;
    let (storage, provider) = storage::setup_backends(&config).await?;
    let state = services::initialize_services(&config, pool, storage, provider);
    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
