//! Provider webhook payloads
//!
//! Bodies are parsed as JSON when possible and kept as text otherwise; each
//! provider decides which shapes it accepts.

use serde::{Deserialize, Serialize};

use crate::job::JobUpdate;
use crate::provider::ProviderError;
use crate::status::map_provider_status;

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookBody {
    Json(serde_json::Value),
    Text(String),
}

impl WebhookBody {
    pub fn from_bytes(raw: &[u8]) -> Self {
        match serde_json::from_slice(raw) {
            Ok(value) => WebhookBody::Json(value),
            Err(_) => WebhookBody::Text(String::from_utf8_lossy(raw).into_owned()),
        }
    }
}

/// Payload posted by the generic REST transcoder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HttpWebhookPayload {
    #[serde(alias = "id", alias = "job_id")]
    pub job_id: String,
    pub status: String,
    #[serde(default, alias = "outputUrl", alias = "hls_url", alias = "output_url")]
    pub hls_url: Option<String>,
    #[serde(default, alias = "message")]
    pub error: Option<String>,
}

/// Payload posted by the first-party worker, as JSON or `key=value` pairs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalWebhookPayload {
    #[serde(alias = "job_id")]
    pub job_id: String,
    pub status: String,
    #[serde(default, alias = "hls_url")]
    pub hls_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl LocalWebhookPayload {
    /// Parse `job_id=..&status=..` (or newline separated) text.
    pub fn from_text(text: &str) -> Result<Self, ProviderError> {
        let mut job_id = None;
        let mut status = None;
        let mut hls_url = None;
        let mut error = None;

        for pair in text.split(['&', '\n']).map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.trim().to_string();
            match key.trim() {
                "job_id" | "jobId" => job_id = Some(value),
                "status" => status = Some(value),
                "hls_url" | "hlsUrl" => hls_url = Some(value),
                "error" => error = Some(value),
                _ => {}
            }
        }

        Ok(LocalWebhookPayload {
            job_id: job_id
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ProviderError::InvalidPayload("missing job_id".to_string()))?,
            status: status
                .ok_or_else(|| ProviderError::InvalidPayload("missing status".to_string()))?,
            hls_url: hls_url.filter(|v| !v.is_empty()),
            error: error.filter(|v| !v.is_empty()),
        })
    }
}

/// A parsed webhook, tagged by the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderWebhook {
    Http(HttpWebhookPayload),
    Local(LocalWebhookPayload),
}

impl ProviderWebhook {
    pub fn into_job_update(self) -> JobUpdate {
        match self {
            ProviderWebhook::Http(p) => JobUpdate {
                status: map_provider_status(&p.status),
                job_id: p.job_id,
                hls_url: p.hls_url,
                error: p.error,
            },
            ProviderWebhook::Local(p) => JobUpdate {
                status: map_provider_status(&p.status),
                job_id: p.job_id,
                hls_url: p.hls_url,
                error: p.error,
            },
        }
    }
}
