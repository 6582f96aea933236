use std::sync::Arc;

use anyhow::{Context, Result};
use kolla_core::Config;
use kolla_storage::Storage;
use kolla_transcoding::TranscodingProvider;

/// Build the object store and the transcoding provider selected by config.
pub async fn setup_backends(
    config: &Config,
) -> Result<(Arc<dyn Storage>, Arc<dyn TranscodingProvider>)> {
    let storage = kolla_storage::create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(backend = %storage.backend(), "Storage initialized");

    let provider = kolla_transcoding::create_provider(config)
        .context("Failed to initialize transcoding provider")?;
    tracing::info!(provider = provider.name(), "Transcoding provider initialized");

    Ok((storage, provider))
}
