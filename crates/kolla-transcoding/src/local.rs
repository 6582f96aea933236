//! First-party worker provider
//!
//! Jobs are handed to a worker outside this process; the id is synthetic. The
//! worker reports through the provider webhook (JSON or `key=value` text) or
//! through the internal processing callback.

use async_trait::async_trait;
use http::HeaderMap;
use uuid::Uuid;

use crate::job::{SubmitJob, SubmittedJob};
use crate::provider::{ProviderError, TranscodingProvider};
use crate::status::JobStatus;
use crate::webhook::{LocalWebhookPayload, ProviderWebhook, WebhookBody};

#[derive(Debug, Default, Clone)]
pub struct LocalProvider;

impl LocalProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TranscodingProvider for LocalProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn submit(&self, job: &SubmitJob) -> Result<SubmittedJob, ProviderError> {
        let job_id = format!("local-{}", Uuid::new_v4());
        tracing::info!(
            job_id = %job_id,
            prefix = %job.destination.prefix,
            webhook_url = %job.webhook_url,
            "Local transcoding job queued"
        );
        Ok(SubmittedJob {
            job_id,
            status: JobStatus::Queued,
        })
    }

    fn verify_signature(&self, _headers: &HeaderMap, _raw_body: &[u8]) -> Result<(), ProviderError> {
        Ok(())
    }

    fn parse_webhook(&self, body: WebhookBody) -> Result<ProviderWebhook, ProviderError> {
        let payload = match body {
            WebhookBody::Json(value) => serde_json::from_value::<LocalWebhookPayload>(value)
                .map_err(|e| ProviderError::InvalidPayload(e.to_string()))?,
            WebhookBody::Text(text) => LocalWebhookPayload::from_text(&text)?,
        };
        Ok(ProviderWebhook::Local(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobDestination;

    #[tokio::test]
    async fn submit_issues_unique_local_ids() {
        let job = SubmitJob {
            source_url: "http://x".to_string(),
            destination: JobDestination {
                bucket: "local".to_string(),
                prefix: "hls/1/1/1/".to_string(),
            },
            webhook_url: "http://localhost/webhook".to_string(),
        };
        let provider = LocalProvider::new();
        let a = provider.submit(&job).await.unwrap();
        let b = provider.submit(&job).await.unwrap();
        assert!(a.job_id.starts_with("local-"));
        assert_ne!(a.job_id, b.job_id);
        assert!(provider.cancel(&a.job_id).await.is_err());
    }

    #[test]
    fn accepts_json_and_text() {
        let provider = LocalProvider::new();
        let json = provider
            .parse_webhook(WebhookBody::Json(serde_json::json!({"jobId": "local-1", "status": "running"})))
            .unwrap();
        assert_eq!(json.into_job_update().status, JobStatus::Processing);

        let text = provider
            .parse_webhook(WebhookBody::Text("job_id=local-1\nstatus=failed\nerror=oom".to_string()))
            .unwrap();
        let update = text.into_job_update();
        assert_eq!(update.status, JobStatus::Failed);
        assert_eq!(update.error.as_deref(), Some("oom"));
    }
}
