use std::time::Duration;

use kolla_core::Config;

/// Provider webhooks land here, relative to `PUBLIC_BASE_URL`.
pub const TRANSCODING_WEBHOOK_PATH: &str = "/api/v0/webhooks/transcoding";

/// The slice of configuration the services need, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub allowed_video_content_types: Vec<String>,
    pub max_video_size_bytes: u64,
    pub presign_ttl: Duration,
    pub playback_url_ttl: Duration,
    pub upload_link_default_hours: i64,
    pub output_bucket: String,
    pub source_url_ttl: Duration,
    pub webhook_url: String,
    pub processing_callback_secret: String,
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Self {
        let transcoding = config.transcoding();
        ServiceSettings {
            allowed_video_content_types: config.allowed_video_content_types().to_vec(),
            max_video_size_bytes: config.max_video_size_bytes(),
            presign_ttl: Duration::from_secs(config.presign_ttl_secs()),
            playback_url_ttl: Duration::from_secs(config.playback_url_ttl_secs()),
            upload_link_default_hours: config.upload_link_default_hours(),
            output_bucket: transcoding.output_bucket.clone(),
            source_url_ttl: Duration::from_secs(transcoding.source_url_ttl_secs),
            webhook_url: format!("{}{}", config.public_base_url(), TRANSCODING_WEBHOOK_PATH),
            processing_callback_secret: config.processing_callback_secret().to_string(),
        }
    }
}
