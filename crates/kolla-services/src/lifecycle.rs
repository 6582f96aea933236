//! Clip lifecycle: removing stored artifacts ahead of the row delete.
//!
//! Everything here is best-effort. Failures are logged and never block the
//! database delete that follows.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use kolla_core::models::{Clip, ClipStatus};
use kolla_storage::{keys, Storage};
use kolla_transcoding::{ProviderError, TranscodingProvider};

/// Concurrent clip cleanups when a whole event goes away.
const CLEANUP_CONCURRENCY: usize = 8;

#[derive(Clone)]
pub struct ClipLifecycle {
    storage: Arc<dyn Storage>,
    provider: Arc<dyn TranscodingProvider>,
}

impl ClipLifecycle {
    pub fn new(storage: Arc<dyn Storage>, provider: Arc<dyn TranscodingProvider>) -> Self {
        Self { storage, provider }
    }

    /// Delete the original, the HLS rendition and any running job for `clip`.
    #[tracing::instrument(skip(self, clip), fields(clip_id = clip.id, team_id = clip.team_id))]
    pub async fn delete_artifacts(&self, clip: &Clip) {
        if let Err(e) = self.storage.delete_object(&clip.storage_key).await {
            tracing::warn!(
                error = %e,
                storage_key = %clip.storage_key,
                "Failed to delete clip original from storage"
            );
        }

        // A failed or in-flight job may have written partial output under the
        // destination prefix even though none is recorded on the row.
        let prefix = clip
            .hls_prefix
            .clone()
            .unwrap_or_else(|| keys::hls_prefix(clip.team_id, clip.event_id, clip.id));
        match self.storage.delete_prefix(&prefix).await {
            Ok(removed) => {
                tracing::debug!(prefix = %prefix, removed, "Deleted HLS rendition");
            }
            Err(e) => {
                tracing::warn!(error = %e, prefix = %prefix, "Failed to delete HLS rendition");
            }
        }

        if clip.status == ClipStatus::Processing {
            if let Some(job_id) = clip.transcoding_job_id.as_deref() {
                self.cancel_job(job_id).await;
            }
        }
    }

    /// Cleanup for many clips, a few at a time.
    pub async fn delete_artifacts_many(&self, clips: &[Clip]) {
        let cleanups: Vec<_> = clips.iter().map(|clip| self.delete_artifacts(clip)).collect();
        stream::iter(cleanups)
            .buffer_unordered(CLEANUP_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;
    }

    async fn cancel_job(&self, job_id: &str) {
        match self.provider.cancel(job_id).await {
            Ok(()) => tracing::info!(job_id = %job_id, "Cancelled transcoding job"),
            Err(ProviderError::Unsupported(_)) => {
                tracing::debug!(
                    job_id = %job_id,
                    provider = self.provider.name(),
                    "Provider cannot cancel jobs"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, job_id = %job_id, "Failed to cancel transcoding job");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockProvider, MockStorage};
    use chrono::Utc;
    use kolla_core::models::ApprovalStatus;

    fn clip(status: ClipStatus, job: Option<&str>) -> Clip {
        let now = Utc::now();
        Clip {
            id: 9,
            team_id: 1,
            event_id: 5,
            uploader_id: None,
            uploader_name: None,
            name: "clip".to_string(),
            storage_key: "originals/1/5/a.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            file_size: None,
            hls_prefix: None,
            duration_s: None,
            width: None,
            height: None,
            status,
            fail_reason: None,
            approval_status: ApprovalStatus::Approved,
            index: 1,
            transcoding_job_id: job.map(String::from),
            upload_link_id: None,
            tags: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn removes_original_and_rendition() {
        let storage = MockStorage::new();
        storage.put("originals/1/5/a.mp4", b"raw");
        storage.put("hls/1/5/9/master.m3u8", b"#EXTM3U");
        storage.put("hls/1/5/9/720p/seg_000.ts", b"ts");
        storage.put("hls/1/5/10/master.m3u8", b"#EXTM3U");
        let provider = MockProvider::new();

        let lifecycle = ClipLifecycle::new(storage.clone(), provider.clone());
        lifecycle
            .delete_artifacts(&clip(ClipStatus::Processing, Some("job-1")))
            .await;

        assert_eq!(storage.keys(), vec!["hls/1/5/10/master.m3u8".to_string()]);
        assert_eq!(provider.cancelled(), vec!["job-1".to_string()]);
    }

    #[tokio::test]
    async fn storage_failures_are_swallowed() {
        let storage = MockStorage::new();
        storage.put("originals/1/5/a.mp4", b"raw");
        storage.fail_delete(true);
        let provider = MockProvider::new();

        let lifecycle = ClipLifecycle::new(storage.clone(), provider.clone());
        lifecycle.delete_artifacts(&clip(ClipStatus::Ready, Some("job-1"))).await;

        assert!(storage.contains("originals/1/5/a.mp4"));
        assert!(provider.cancelled().is_empty());
    }
}
