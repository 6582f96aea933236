//! Configuration module
//!
//! Configuration is read once at startup from the environment (a `.env` file is
//! honoured through `dotenvy`) and validated before anything is wired together.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

// Common constants
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const PRESIGN_TTL_SECS: u64 = 900;
const SOURCE_URL_TTL_SECS: u64 = 6 * 60 * 60;
const PLAYBACK_URL_TTL_SECS: u64 = 4 * 60 * 60;
const MAX_VIDEO_SIZE_MB: u64 = 4096;
const UPLOAD_LINK_DEFAULT_HOURS: i64 = 72;
const TRANSCODER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_VIDEO_CONTENT_TYPES: &str =
    "video/mp4,video/quicktime,video/x-msvideo,video/webm,video/x-matroska,video/mpeg";

/// Which transcoding adapter the process talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscoderKind {
    /// Generic REST transcoder (`TRANSCODER_API_URL`)
    Http,
    /// First-party worker that reports back through the processing callback
    Local,
}

impl FromStr for TranscoderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(TranscoderKind::Http),
            "local" => Ok(TranscoderKind::Local),
            other => Err(anyhow::anyhow!("Unknown transcoding provider: {}", other)),
        }
    }
}

impl Display for TranscoderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TranscoderKind::Http => write!(f, "http"),
            TranscoderKind::Local => write!(f, "local"),
        }
    }
}

/// Where clip originals and renditions are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            other => Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            StorageBackend::S3 => "s3",
            StorageBackend::Local => "local",
        })
    }
}

/// Base configuration for the HTTP service
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub environment: String,
    pub log_format: String,
}

/// Transcoding provider settings
#[derive(Clone, Debug)]
pub struct TranscodingSettings {
    pub provider: TranscoderKind,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    /// Shared secret for provider webhook signatures. Unset disables verification.
    pub webhook_secret: Option<String>,
    pub output_bucket: String,
    pub source_url_ttl_secs: u64,
    pub request_timeout_secs: u64,
}

/// Ingestion service configuration
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub base: BaseConfig,
    pub database_url: String,
    /// Externally reachable origin of this service, used to build webhook URLs.
    pub public_base_url: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Upload policy
    pub presign_ttl_secs: u64,
    pub playback_url_ttl_secs: u64,
    pub allowed_video_content_types: Vec<String>,
    pub max_video_size_bytes: u64,
    pub upload_link_default_hours: i64,
    // Transcoding
    pub transcoding: TranscodingSettings,
    pub processing_callback_secret: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<IngestConfig>);

impl Config {
    fn inner(&self) -> &IngestConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = IngestConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn public_base_url(&self) -> &str {
        self.inner().public_base_url.trim_end_matches('/')
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn presign_ttl_secs(&self) -> u64 {
        self.inner().presign_ttl_secs
    }

    pub fn playback_url_ttl_secs(&self) -> u64 {
        self.inner().playback_url_ttl_secs
    }

    pub fn allowed_video_content_types(&self) -> &[String] {
        &self.inner().allowed_video_content_types
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.inner().max_video_size_bytes
    }

    pub fn upload_link_default_hours(&self) -> i64 {
        self.inner().upload_link_default_hours
    }

    pub fn transcoding(&self) -> &TranscodingSettings {
        &self.inner().transcoding
    }

    pub fn processing_callback_secret(&self) -> &str {
        &self.inner().processing_callback_secret
    }
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment: environment.clone(),
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "compact".to_string())
                .to_lowercase(),
        };

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .parse::<StorageBackend>()?;

        let s3_bucket = env::var("S3_BUCKET").ok().filter(|s| !s.is_empty());

        let transcoding = TranscodingSettings {
            provider: env::var("TRANSCODING_PROVIDER")
                .unwrap_or_else(|_| "local".to_string())
                .parse()?,
            api_url: env::var("TRANSCODER_API_URL").ok().filter(|s| !s.is_empty()),
            api_key: env::var("TRANSCODER_API_KEY").ok().filter(|s| !s.is_empty()),
            webhook_secret: env::var("TRANSCODER_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            output_bucket: env::var("TRANSCODING_OUTPUT_BUCKET")
                .ok()
                .filter(|s| !s.is_empty())
                .or_else(|| s3_bucket.clone())
                .unwrap_or_else(|| "local".to_string()),
            source_url_ttl_secs: env::var("TRANSCODING_SOURCE_URL_TTL_SECS")
                .unwrap_or_else(|_| SOURCE_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(SOURCE_URL_TTL_SECS),
            request_timeout_secs: env::var("TRANSCODER_TIMEOUT_SECS")
                .unwrap_or_else(|_| TRANSCODER_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(TRANSCODER_TIMEOUT_SECS),
        };

        let config = IngestConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://kolla.db?mode=rwc".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:4000".to_string()),
            storage_backend,
            s3_bucket,
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok()
                .filter(|s| !s.is_empty()),
            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            presign_ttl_secs: env::var("PRESIGN_TTL_SECS")
                .unwrap_or_else(|_| PRESIGN_TTL_SECS.to_string())
                .parse()
                .unwrap_or(PRESIGN_TTL_SECS),
            playback_url_ttl_secs: env::var("PLAYBACK_URL_TTL_SECS")
                .unwrap_or_else(|_| PLAYBACK_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(PLAYBACK_URL_TTL_SECS),
            allowed_video_content_types: env::var("ALLOWED_VIDEO_CONTENT_TYPES")
                .unwrap_or_else(|_| DEFAULT_VIDEO_CONTENT_TYPES.to_string())
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            max_video_size_bytes: env::var("MAX_VIDEO_SIZE_MB")
                .unwrap_or_else(|_| MAX_VIDEO_SIZE_MB.to_string())
                .parse::<u64>()
                .unwrap_or(MAX_VIDEO_SIZE_MB)
                * 1024
                * 1024,
            upload_link_default_hours: env::var("UPLOAD_LINK_DEFAULT_HOURS")
                .unwrap_or_else(|_| UPLOAD_LINK_DEFAULT_HOURS.to_string())
                .parse()
                .unwrap_or(UPLOAD_LINK_DEFAULT_HOURS),
            transcoding,
            processing_callback_secret: env::var("PROCESSING_CALLBACK_SECRET").map_err(|_| {
                anyhow::anyhow!("PROCESSING_CALLBACK_SECRET must be set for the processing callback")
            })?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if self.processing_callback_secret.len() < 16 {
            return Err(anyhow::anyhow!(
                "PROCESSING_CALLBACK_SECRET must be at least 16 characters long"
            ));
        }

        if !self.database_url.starts_with("sqlite:") {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a SQLite connection string (sqlite://...)"
            ));
        }

        if self.allowed_video_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_VIDEO_CONTENT_TYPES must list at least one content type"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        if self.transcoding.provider == TranscoderKind::Http && self.transcoding.api_url.is_none()
        {
            return Err(anyhow::anyhow!(
                "TRANSCODER_API_URL must be set when TRANSCODING_PROVIDER=http"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IngestConfig {
        IngestConfig {
            base: BaseConfig {
                server_port: 4000,
                cors_origins: vec!["*".to_string()],
                db_max_connections: 5,
                db_timeout_seconds: 5,
                jwt_secret: "x".repeat(32),
                environment: "development".to_string(),
                log_format: "compact".to_string(),
            },
            database_url: "sqlite::memory:".to_string(),
            public_base_url: "http://localhost:4000".to_string(),
            storage_backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: Some("/tmp/kolla".to_string()),
            local_storage_base_url: Some("http://localhost:4000/media".to_string()),
            presign_ttl_secs: PRESIGN_TTL_SECS,
            playback_url_ttl_secs: PLAYBACK_URL_TTL_SECS,
            allowed_video_content_types: vec!["video/mp4".to_string()],
            max_video_size_bytes: 1024,
            upload_link_default_hours: UPLOAD_LINK_DEFAULT_HOURS,
            transcoding: TranscodingSettings {
                provider: TranscoderKind::Local,
                api_url: None,
                api_key: None,
                webhook_secret: None,
                output_bucket: "local".to_string(),
                source_url_ttl_secs: SOURCE_URL_TTL_SECS,
                request_timeout_secs: TRANSCODER_TIMEOUT_SECS,
            },
            processing_callback_secret: "callback-secret-123".to_string(),
        }
    }

    #[test]
    fn sample_config_is_valid() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn short_jwt_secret_is_rejected() {
        let mut config = sample();
        config.base.jwt_secret = "short".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn http_provider_requires_api_url() {
        let mut config = sample();
        config.transcoding.provider = TranscoderKind::Http;
        assert!(config.validate().is_err());

        config.transcoding.api_url = Some("https://transcoder.example.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn s3_backend_requires_bucket_and_region() {
        let mut config = sample();
        config.storage_backend = StorageBackend::S3;
        assert!(config.validate().is_err());

        config.s3_bucket = Some("kolla-media".to_string());
        assert!(config.validate().is_err());

        config.s3_region = Some("eu-west-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_sqlite_database_url_is_rejected() {
        let mut config = sample();
        config.database_url = "postgresql://localhost/kolla".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn transcoder_kind_parses_case_insensitively() {
        assert_eq!("HTTP".parse::<TranscoderKind>().unwrap(), TranscoderKind::Http);
        assert_eq!(" local ".parse::<TranscoderKind>().unwrap(), TranscoderKind::Local);
        assert!("mux".parse::<TranscoderKind>().is_err());
    }

    #[test]
    fn public_base_url_drops_trailing_slash() {
        let mut inner = sample();
        inner.public_base_url = "https://kolla.example.com/".to_string();
        let config = Config(Box::new(inner));
        assert_eq!(config.public_base_url(), "https://kolla.example.com");
    }
}
