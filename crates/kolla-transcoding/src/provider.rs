//! Provider strategy trait

use async_trait::async_trait;
use http::HeaderMap;
use kolla_core::AppError;
use thiserror::Error;

use crate::job::{SubmitJob, SubmittedJob};
use crate::webhook::{ProviderWebhook, WebhookBody};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Transcoder request failed: {0}")]
    Request(String),

    #[error("Transcoder returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid transcoder response: {0}")]
    InvalidResponse(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("{0} is not supported by this provider")]
    Unsupported(&'static str),

    #[error("Transcoder configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Request(err.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidSignature => {
                AppError::Unauthorized("Invalid webhook signature".to_string())
            }
            ProviderError::InvalidPayload(msg) => AppError::InvalidInput(msg),
            ProviderError::Config(msg) => AppError::Internal(msg),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// One external (or first-party) transcoding backend.
#[async_trait]
pub trait TranscodingProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Start a job. Returns the provider's job id.
    async fn submit(&self, job: &SubmitJob) -> Result<SubmittedJob, ProviderError>;

    /// Best-effort cancellation of a running job.
    async fn cancel(&self, _job_id: &str) -> Result<(), ProviderError> {
        Err(ProviderError::Unsupported("cancel"))
    }

    /// Check the webhook signature against the raw body. Providers without a
    /// configured secret accept everything.
    fn verify_signature(&self, headers: &HeaderMap, raw_body: &[u8]) -> Result<(), ProviderError>;

    /// Decode a webhook body into this provider's payload variant.
    fn parse_webhook(&self, body: WebhookBody) -> Result<ProviderWebhook, ProviderError>;
}
