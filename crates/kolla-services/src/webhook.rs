//! Inbound status reports: the first-party processing callback and provider
//! webhooks.
//!
//! Provider webhooks are acknowledged even when they cannot be applied; only
//! a bad signature or an internal failure produces an error. The processing
//! callback is first-party and gets precise errors instead.

use std::sync::Arc;

use http::HeaderMap;
use kolla_core::{
    models::{ClipMetadata, ClipStatus, ProcessingCallback},
    AppError,
};
use kolla_db::ClipRepository;
use kolla_storage::keys;
use kolla_transcoding::{JobStatus, TranscodingProvider, WebhookBody};

use crate::tokens::secure_compare;

/// What a provider webhook did. Handlers answer `OK` for all of them.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Applied { clip_id: i64, status: ClipStatus },
    /// Still queued or running.
    InProgress { clip_id: i64 },
    Dropped(&'static str),
}

#[derive(Clone)]
pub struct WebhookReceiver {
    clips: ClipRepository,
    provider: Arc<dyn TranscodingProvider>,
    callback_secret: String,
}

impl WebhookReceiver {
    pub fn new(
        clips: ClipRepository,
        provider: Arc<dyn TranscodingProvider>,
        callback_secret: String,
    ) -> Self {
        Self {
            clips,
            provider,
            callback_secret,
        }
    }

    /// Checks the processing worker's shared secret, in constant time.
    pub fn verify_job_secret(&self, secret: Option<&str>) -> Result<(), AppError> {
        match secret {
            Some(secret) if secure_compare(secret, &self.callback_secret) => Ok(()),
            _ => Err(AppError::Unauthorized("Invalid job secret".to_string())),
        }
    }

    #[tracing::instrument(skip(self, secret, callback), fields(clip_id = callback.clip_id, failed = callback.failed))]
    pub async fn processing_callback(
        &self,
        secret: Option<&str>,
        callback: ProcessingCallback,
    ) -> Result<(), AppError> {
        self.verify_job_secret(secret)?;

        let clip_id = callback.clip_id;
        let clip = self
            .clips
            .get_by_id(clip_id)
            .await?
            .ok_or_else(|| AppError::not_found("Clip", clip_id))?;

        let metadata = ClipMetadata {
            duration_s: callback.duration_s,
            width: callback.width,
            height: callback.height,
        };
        self.clips.update_metadata(clip_id, metadata).await?;

        if callback.failed {
            let reason = callback
                .reason
                .as_deref()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or("processing failed");
            if !self.clips.mark_failed(clip_id, reason).await? {
                return Err(illegal_transition(clip_id, clip.status, ClipStatus::Failed));
            }
            tracing::info!(clip_id, reason, "Clip processing failed");
        } else if let Some(prefix) = callback.hls_prefix.as_deref() {
            if !keys::is_safe_key(prefix) {
                return Err(AppError::InvalidInput(format!(
                    "Invalid HLS prefix '{}'",
                    prefix
                )));
            }
            let prefix = keys::ensure_trailing_slash(prefix);
            if !self.clips.mark_ready(clip_id, &prefix).await? {
                return Err(illegal_transition(clip_id, clip.status, ClipStatus::Ready));
            }
            tracing::info!(clip_id, prefix = %prefix, "Clip ready");
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, headers, raw_body), fields(provider = self.provider.name(), bytes = raw_body.len()))]
    pub async fn provider_webhook(
        &self,
        headers: &HeaderMap,
        raw_body: &[u8],
    ) -> Result<WebhookOutcome, AppError> {
        self.provider.verify_signature(headers, raw_body)?;

        let webhook = match self.provider.parse_webhook(WebhookBody::from_bytes(raw_body)) {
            Ok(webhook) => webhook,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping unparseable transcoding webhook");
                return Ok(WebhookOutcome::Dropped("unparseable payload"));
            }
        };
        let update = webhook.into_job_update();

        let Some(clip) = self.clips.find_by_job_id(&update.job_id).await? else {
            tracing::warn!(job_id = %update.job_id, "Dropping webhook for unknown job");
            return Ok(WebhookOutcome::Dropped("unknown job"));
        };

        let applied = match update.status {
            JobStatus::Queued | JobStatus::Processing => {
                tracing::debug!(
                    clip_id = clip.id,
                    job_id = %update.job_id,
                    status = update.status.as_str(),
                    "Transcoding in progress"
                );
                return Ok(WebhookOutcome::InProgress { clip_id: clip.id });
            }
            JobStatus::Completed => {
                let submitted = keys::hls_prefix(clip.team_id, clip.event_id, clip.id);
                let prefix = update.hls_prefix(&submitted);
                self.clips
                    .mark_ready(clip.id, &prefix)
                    .await?
                    .then_some(ClipStatus::Ready)
            }
            JobStatus::Failed => {
                let reason = update
                    .error
                    .as_deref()
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or("transcoding failed");
                self.clips
                    .mark_failed(clip.id, reason)
                    .await?
                    .then_some(ClipStatus::Failed)
            }
        };

        match applied {
            Some(status) => {
                tracing::info!(
                    clip_id = clip.id,
                    job_id = %update.job_id,
                    status = %status,
                    "Applied transcoding result"
                );
                Ok(WebhookOutcome::Applied {
                    clip_id: clip.id,
                    status,
                })
            }
            None => {
                tracing::warn!(
                    clip_id = clip.id,
                    job_id = %update.job_id,
                    current = %clip.status,
                    "Dropping webhook for clip no longer processing"
                );
                Ok(WebhookOutcome::Dropped("clip not processing"))
            }
        }
    }
}

fn illegal_transition(clip_id: i64, from: ClipStatus, to: ClipStatus) -> AppError {
    AppError::InvalidState(format!(
        "Clip {} cannot move from {} to {}",
        clip_id, from, to
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        Fixture, MockProvider, MOCK_SIGNATURE_HEADER, TEST_CALLBACK_SECRET,
    };
    use http::HeaderValue;

    async fn processing_clip(fixture: &Fixture, job_id: Option<&str>) -> i64 {
        let clips = ClipRepository::new(fixture.pool.clone());
        let id = fixture.clip("corner").await.unwrap();
        assert!(clips.mark_uploaded(id).await.unwrap());
        assert!(clips.mark_processing(id).await.unwrap());
        if let Some(job_id) = job_id {
            assert!(clips.set_job_id(id, job_id).await.unwrap());
        }
        id
    }

    fn receiver(fixture: &Fixture, provider: Arc<MockProvider>) -> WebhookReceiver {
        WebhookReceiver::new(
            ClipRepository::new(fixture.pool.clone()),
            provider,
            TEST_CALLBACK_SECRET.to_string(),
        )
    }

    async fn status(fixture: &Fixture, id: i64) -> (ClipStatus, Option<String>) {
        let clip = ClipRepository::new(fixture.pool.clone())
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap();
        (clip.status, clip.hls_prefix)
    }

    #[tokio::test]
    async fn callback_requires_secret() {
        let fixture = Fixture::new().await.unwrap();
        let receiver = receiver(&fixture, MockProvider::new());
        let id = processing_clip(&fixture, None).await;
        let callback = ProcessingCallback {
            clip_id: id,
            hls_prefix: Some("hls/x/".to_string()),
            ..Default::default()
        };

        let err = receiver
            .processing_callback(Some("wrong"), callback.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let err = receiver
            .processing_callback(None, callback)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(status(&fixture, id).await.0, ClipStatus::Processing);
    }

    #[tokio::test]
    async fn callback_applies_metadata_then_ready() {
        let fixture = Fixture::new().await.unwrap();
        let receiver = receiver(&fixture, MockProvider::new());
        let id = processing_clip(&fixture, None).await;

        receiver
            .processing_callback(
                Some(TEST_CALLBACK_SECRET),
                ProcessingCallback {
                    clip_id: id,
                    duration_s: Some(31.5),
                    width: Some(1920),
                    height: Some(1080),
                    hls_prefix: Some("hls/1/1/1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let clip = ClipRepository::new(fixture.pool.clone())
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(clip.status, ClipStatus::Ready);
        assert_eq!(clip.hls_prefix.as_deref(), Some("hls/1/1/1/"));
        assert_eq!(clip.duration_s, Some(31.5));

        // A late failure report cannot regress a ready clip.
        let err = receiver
            .processing_callback(
                Some(TEST_CALLBACK_SECRET),
                ProcessingCallback {
                    clip_id: id,
                    failed: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(status(&fixture, id).await.0, ClipStatus::Ready);
    }

    #[tokio::test]
    async fn callback_for_unknown_clip_is_not_found() {
        let fixture = Fixture::new().await.unwrap();
        let receiver = receiver(&fixture, MockProvider::new());
        let err = receiver
            .processing_callback(
                Some(TEST_CALLBACK_SECRET),
                ProcessingCallback {
                    clip_id: 4242,
                    failed: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn completed_webhook_marks_ready_at_submitted_prefix() {
        let fixture = Fixture::new().await.unwrap();
        let receiver = receiver(&fixture, MockProvider::new());
        let id = processing_clip(&fixture, Some("job-7")).await;

        let outcome = receiver
            .provider_webhook(&HeaderMap::new(), br#"{"jobId":"job-7","status":"Finished"}"#)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WebhookOutcome::Applied {
                clip_id: id,
                status: ClipStatus::Ready
            }
        );
        let expected = format!("hls/{}/{}/{}/", fixture.team_id, fixture.event_id, id);
        assert_eq!(status(&fixture, id).await, (ClipStatus::Ready, Some(expected)));

        // Replays are acknowledged and change nothing.
        let outcome = receiver
            .provider_webhook(&HeaderMap::new(), b"jobId=job-7&status=failed")
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Dropped("clip not processing"));
        assert_eq!(status(&fixture, id).await.0, ClipStatus::Ready);
    }

    #[tokio::test]
    async fn failed_and_running_webhooks() {
        let fixture = Fixture::new().await.unwrap();
        let receiver = receiver(&fixture, MockProvider::new());
        let id = processing_clip(&fixture, Some("job-8")).await;

        let outcome = receiver
            .provider_webhook(&HeaderMap::new(), b"jobId=job-8&status=transcoding")
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::InProgress { clip_id: id });

        receiver
            .provider_webhook(&HeaderMap::new(), br#"{"jobId":"job-8","status":"error"}"#)
            .await
            .unwrap();
        let clip = ClipRepository::new(fixture.pool.clone())
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(clip.status, ClipStatus::Failed);
        assert_eq!(clip.fail_reason.as_deref(), Some("transcoding failed"));
    }

    #[tokio::test]
    async fn unknown_jobs_and_garbage_are_dropped() {
        let fixture = Fixture::new().await.unwrap();
        let receiver = receiver(&fixture, MockProvider::new());

        let outcome = receiver
            .provider_webhook(&HeaderMap::new(), br#"{"jobId":"ghost","status":"completed"}"#)
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Dropped("unknown job"));

        let outcome = receiver
            .provider_webhook(&HeaderMap::new(), b"not a webhook")
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Dropped("unparseable payload"));
    }

    #[tokio::test]
    async fn bad_signature_is_rejected_without_mutation() {
        let fixture = Fixture::new().await.unwrap();
        let receiver = receiver(&fixture, MockProvider::with_secret("hook-secret"));
        let id = processing_clip(&fixture, Some("job-9")).await;
        let body = br#"{"jobId":"job-9","status":"completed"}"#;

        let mut headers = HeaderMap::new();
        headers.insert(MOCK_SIGNATURE_HEADER, HeaderValue::from_static("nope"));
        let err = receiver.provider_webhook(&headers, body).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(status(&fixture, id).await.0, ClipStatus::Processing);

        headers.insert(MOCK_SIGNATURE_HEADER, HeaderValue::from_static("hook-secret"));
        receiver.provider_webhook(&headers, body).await.unwrap();
        assert_eq!(status(&fixture, id).await.0, ClipStatus::Ready);
    }
}
