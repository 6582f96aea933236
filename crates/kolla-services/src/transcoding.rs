//! Hands uploaded originals to the transcoding provider.
//!
//! Submission is not transactional. The clip moves to `processing` first so a
//! concurrent enqueue loses the conditional update; any failure after that
//! point marks the clip `failed` with the error text. There is no retry.

use std::sync::Arc;
use std::time::Duration;

use kolla_core::{
    models::{Clip, ClipStatus},
    AppError,
};
use kolla_db::ClipRepository;
use kolla_storage::{keys, Storage};
use kolla_transcoding::{JobDestination, SubmitJob, TranscodingProvider};

use crate::settings::ServiceSettings;

#[derive(Clone)]
pub struct TranscodingService {
    clips: ClipRepository,
    storage: Arc<dyn Storage>,
    provider: Arc<dyn TranscodingProvider>,
    output_bucket: String,
    source_url_ttl: Duration,
    webhook_url: String,
}

impl TranscodingService {
    pub fn new(
        clips: ClipRepository,
        storage: Arc<dyn Storage>,
        provider: Arc<dyn TranscodingProvider>,
        settings: &ServiceSettings,
    ) -> Self {
        Self {
            clips,
            storage,
            provider,
            output_bucket: settings.output_bucket.clone(),
            source_url_ttl: settings.source_url_ttl,
            webhook_url: settings.webhook_url.clone(),
        }
    }

    /// Submit an `uploaded` clip. Returns the clip as it stands afterwards.
    #[tracing::instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn enqueue(&self, team_id: i64, clip_id: i64) -> Result<Clip, AppError> {
        let clip = self
            .clips
            .get(team_id, clip_id)
            .await?
            .ok_or_else(|| AppError::not_found("Clip", clip_id))?;

        if clip.status != ClipStatus::Uploaded {
            return Err(AppError::InvalidState(format!(
                "Clip {} is {}, expected uploaded",
                clip_id, clip.status
            )));
        }
        if !self.clips.mark_processing(clip_id).await? {
            return Err(AppError::InvalidState(format!(
                "Clip {} is already being processed",
                clip_id
            )));
        }

        if let Err(e) = self.submit(&clip).await {
            tracing::warn!(error = %e, clip_id, "Transcoding submission failed");
            match self.clips.mark_failed(clip_id, &e.to_string()).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(clip_id, "Clip left processing before it could be marked failed")
                }
                Err(mark_err) => {
                    tracing::error!(error = %mark_err, clip_id, "Failed to mark clip failed")
                }
            }
            return Err(e);
        }

        self.clips
            .get(team_id, clip_id)
            .await?
            .ok_or_else(|| AppError::not_found("Clip", clip_id))
    }

    async fn submit(&self, clip: &Clip) -> Result<(), AppError> {
        let source_url = self
            .storage
            .presign_get(&clip.storage_key, self.source_url_ttl)
            .await?;

        let job = SubmitJob {
            source_url,
            destination: JobDestination {
                bucket: self.output_bucket.clone(),
                prefix: keys::hls_prefix(clip.team_id, clip.event_id, clip.id),
            },
            webhook_url: self.webhook_url.clone(),
        };
        let submitted = self.provider.submit(&job).await?;

        if !self.clips.set_job_id(clip.id, &submitted.job_id).await? {
            // A fast webhook or callback already finished the clip.
            tracing::warn!(
                clip_id = clip.id,
                job_id = %submitted.job_id,
                "Clip left processing before its job id was recorded"
            );
            return Ok(());
        }

        tracing::info!(
            clip_id = clip.id,
            job_id = %submitted.job_id,
            prefix = %job.destination.prefix,
            "Transcoding job submitted"
        );
        Ok(())
    }
}
