//! Generic REST transcoder
//!
//! `POST {api_url}/jobs` starts a job, `DELETE {api_url}/jobs/{id}` cancels it.
//! Webhooks carry an `x-transcoder-signature` header holding the hex
//! HMAC-SHA256 of the raw body, optionally prefixed with `sha256=`.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use http::HeaderMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::job::{SubmitJob, SubmittedJob};
use crate::provider::{ProviderError, TranscodingProvider};
use crate::status::map_provider_status;
use crate::webhook::{HttpWebhookPayload, ProviderWebhook, WebhookBody};

pub const SIGNATURE_HEADER: &str = "x-transcoder-signature";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateJobRequest<'a> {
    input: &'a str,
    output: OutputSpec<'a>,
    webhook_url: &'a str,
    format: &'static str,
}

#[derive(Debug, Serialize)]
struct OutputSpec<'a> {
    bucket: &'a str,
    prefix: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateJobResponse {
    #[serde(alias = "jobId", alias = "job_id")]
    id: String,
    #[serde(default)]
    status: Option<String>,
}

pub struct HttpProvider {
    http_client: Client,
    api_url: String,
    api_key: Option<String>,
    webhook_secret: Option<String>,
}

impl Debug for HttpProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        // Credentials stay out of logs.
        f.debug_struct("HttpProvider")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl HttpProvider {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        webhook_secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            webhook_secret,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn error_from(response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        ProviderError::Api { status, body }
    }
}

#[async_trait]
impl TranscodingProvider for HttpProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    #[tracing::instrument(skip(self, job), fields(provider = "http", prefix = %job.destination.prefix))]
    async fn submit(&self, job: &SubmitJob) -> Result<SubmittedJob, ProviderError> {
        let body = CreateJobRequest {
            input: &job.source_url,
            output: OutputSpec {
                bucket: &job.destination.bucket,
                prefix: &job.destination.prefix,
            },
            webhook_url: &job.webhook_url,
            format: "hls",
        };

        let response = self
            .authorized(self.http_client.post(format!("{}/jobs", self.api_url)))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let created: CreateJobResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if created.id.trim().is_empty() {
            return Err(ProviderError::InvalidResponse(
                "empty job id".to_string(),
            ));
        }

        tracing::info!(job_id = %created.id, "Transcoding job submitted");

        Ok(SubmittedJob {
            status: created
                .status
                .as_deref()
                .map(map_provider_status)
                .unwrap_or(crate::JobStatus::Queued),
            job_id: created.id,
        })
    }

    async fn cancel(&self, job_id: &str) -> Result<(), ProviderError> {
        let response = self
            .authorized(
                self.http_client
                    .delete(format!("{}/jobs/{}", self.api_url, job_id)),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }

    fn verify_signature(&self, headers: &HeaderMap, raw_body: &[u8]) -> Result<(), ProviderError> {
        let Some(secret) = &self.webhook_secret else {
            return Ok(());
        };

        let provided = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim())
            .ok_or(ProviderError::InvalidSignature)?;
        let provided = provided.strip_prefix("sha256=").unwrap_or(provided);
        let tag = hex::decode(provided).map_err(|_| ProviderError::InvalidSignature)?;

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        mac.update(raw_body);
        mac.verify_slice(&tag)
            .map_err(|_| ProviderError::InvalidSignature)
    }

    fn parse_webhook(&self, body: WebhookBody) -> Result<ProviderWebhook, ProviderError> {
        match body {
            WebhookBody::Json(value) => serde_json::from_value::<HttpWebhookPayload>(value)
                .map(ProviderWebhook::Http)
                .map_err(|e| ProviderError::InvalidPayload(e.to_string())),
            WebhookBody::Text(_) => Err(ProviderError::InvalidPayload(
                "expected a JSON body".to_string(),
            )),
        }
    }
}

/// Hex signature for `body`, as the transcoder computes it.
pub fn sign_body(secret: &str, body: &[u8]) -> Result<String, ProviderError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| ProviderError::Config(e.to_string()))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}
