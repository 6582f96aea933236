use std::sync::Arc;
use std::time::Duration;

use kolla_core::{Config, TranscoderKind};

use crate::http_provider::HttpProvider;
use crate::local::LocalProvider;
use crate::provider::{ProviderError, TranscodingProvider};

/// Build the provider selected by `TRANSCODING_PROVIDER`.
pub fn create_provider(config: &Config) -> Result<Arc<dyn TranscodingProvider>, ProviderError> {
    let settings = config.transcoding();
    match settings.provider {
        TranscoderKind::Http => {
            let api_url = settings.api_url.clone().ok_or_else(|| {
                ProviderError::Config("TRANSCODER_API_URL not configured".to_string())
            })?;
            let provider = HttpProvider::new(
                api_url,
                settings.api_key.clone(),
                settings.webhook_secret.clone(),
                Duration::from_secs(settings.request_timeout_secs),
            )?;
            Ok(Arc::new(provider))
        }
        TranscoderKind::Local => Ok(Arc::new(LocalProvider::new())),
    }
}
