//! Upload flow: presign, confirm, enqueue.
//!
//! Team members upload with a session; anyone holding an upload link can do
//! the same for that link's event, but their clips wait for approval.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kolla_core::{
    models::{
        ApprovalStatus, Clip, ClipStatus, NewClip, PresignUploadRequest, PresignUploadResponse,
        PublicPresignRequest, UploadLink,
    },
    validation, Actor, AppError,
};
use kolla_db::{ClipRepository, UploadLinkRepository};
use kolla_storage::{keys, Storage};
use uuid::Uuid;

use crate::clips::ClipService;
use crate::links::require_active_upload_link;
use crate::settings::ServiceSettings;
use crate::transcoding::TranscodingService;

/// Fields common to both presign variants.
struct UploadDraft<'a> {
    team_id: i64,
    event_id: i64,
    filename: &'a str,
    content_type: &'a str,
    file_size: Option<i64>,
    index: Option<i64>,
    name: Option<&'a str>,
    uploader_id: Option<Uuid>,
    uploader_name: Option<String>,
    approval_status: ApprovalStatus,
    upload_link_id: Option<i64>,
}

#[derive(Clone)]
pub struct UploadService {
    clips: ClipRepository,
    upload_links: UploadLinkRepository,
    clip_service: ClipService,
    transcoding: TranscodingService,
    storage: Arc<dyn Storage>,
    allowed_content_types: Vec<String>,
    max_video_size_bytes: u64,
    presign_ttl: Duration,
}

impl UploadService {
    pub fn new(
        clips: ClipRepository,
        upload_links: UploadLinkRepository,
        clip_service: ClipService,
        transcoding: TranscodingService,
        storage: Arc<dyn Storage>,
        settings: &ServiceSettings,
    ) -> Self {
        Self {
            clips,
            upload_links,
            clip_service,
            transcoding,
            storage,
            allowed_content_types: settings.allowed_video_content_types.clone(),
            max_video_size_bytes: settings.max_video_size_bytes,
            presign_ttl: settings.presign_ttl,
        }
    }

    #[tracing::instrument(skip(self, actor, request), fields(team_id = actor.team_id, event_id = request.event_id))]
    pub async fn presign(
        &self,
        actor: &Actor,
        request: PresignUploadRequest,
    ) -> Result<PresignUploadResponse, AppError> {
        self.clip_service
            .require_event(actor.team_id, request.event_id)
            .await?;

        self.create_upload(UploadDraft {
            team_id: actor.team_id,
            event_id: request.event_id,
            filename: &request.filename,
            content_type: &request.content_type,
            file_size: request.file_size,
            index: request.index,
            name: request.name.as_deref(),
            uploader_id: Some(actor.user_id),
            uploader_name: None,
            approval_status: ApprovalStatus::Approved,
            upload_link_id: None,
        })
        .await
    }

    pub async fn confirm(&self, actor: &Actor, clip_id: i64) -> Result<Clip, AppError> {
        let clip = self.clip_service.require_visible(actor, clip_id).await?;
        self.confirm_clip(clip).await
    }

    pub async fn enqueue_processing(&self, actor: &Actor, clip_id: i64) -> Result<Clip, AppError> {
        self.clip_service.require_visible(actor, clip_id).await?;
        self.transcoding.enqueue(actor.team_id, clip_id).await
    }

    #[tracing::instrument(skip(self, token, request))]
    pub async fn presign_with_link(
        &self,
        token: &str,
        request: PublicPresignRequest,
    ) -> Result<PresignUploadResponse, AppError> {
        let link = self.active_link(token).await?;
        let uploader_name = validation::validate_name("uploaderName", &request.uploader_name)?;

        self.create_upload(UploadDraft {
            team_id: link.team_id,
            event_id: link.event_id,
            filename: &request.filename,
            content_type: &request.content_type,
            file_size: request.file_size,
            index: request.index,
            name: request.name.as_deref(),
            uploader_id: None,
            uploader_name: Some(uploader_name),
            approval_status: ApprovalStatus::Pending,
            upload_link_id: Some(link.id),
        })
        .await
    }

    pub async fn confirm_with_link(&self, token: &str, clip_id: i64) -> Result<Clip, AppError> {
        let link = self.active_link(token).await?;
        let clip = self.link_clip(&link, clip_id).await?;
        self.confirm_clip(clip).await
    }

    pub async fn enqueue_with_link(&self, token: &str, clip_id: i64) -> Result<Clip, AppError> {
        let link = self.active_link(token).await?;
        self.link_clip(&link, clip_id).await?;
        self.transcoding.enqueue(link.team_id, clip_id).await
    }

    pub async fn reserve_with_link(&self, token: &str, count: i64) -> Result<i64, AppError> {
        let link = self.active_link(token).await?;
        self.clip_service
            .reserve_indices(link.team_id, link.event_id, count)
            .await
    }

    async fn active_link(&self, token: &str) -> Result<UploadLink, AppError> {
        require_active_upload_link(&self.upload_links, token, Utc::now()).await
    }

    /// Clips created through a different link look missing.
    async fn link_clip(&self, link: &UploadLink, clip_id: i64) -> Result<Clip, AppError> {
        let clip = self.clip_service.require(link.team_id, clip_id).await?;
        if clip.upload_link_id != Some(link.id) {
            return Err(AppError::not_found("Clip", clip_id));
        }
        Ok(clip)
    }

    async fn create_upload(&self, draft: UploadDraft<'_>) -> Result<PresignUploadResponse, AppError> {
        validation::validate_content_type(draft.content_type, &self.allowed_content_types)?;
        validation::validate_file_size(draft.file_size, self.max_video_size_bytes)?;
        let name = validation::validate_name("name", draft.name.unwrap_or(draft.filename))?;

        let index = match draft.index {
            Some(index) if index >= 1 => index,
            Some(index) => {
                return Err(AppError::InvalidInput(format!(
                    "index must be at least 1, got {}",
                    index
                )))
            }
            None => {
                self.clip_service
                    .reserve_indices(draft.team_id, draft.event_id, 1)
                    .await?
            }
        };

        let extension = validation::file_extension(draft.filename);
        let key = keys::original_key(draft.team_id, draft.event_id, &extension);
        let presigned_url = self
            .storage
            .presign_put(&key, draft.content_type, self.presign_ttl)
            .await?;
        let expires_at = Utc::now() + chrono::Duration::seconds(self.presign_ttl.as_secs() as i64);

        let clip = self
            .clips
            .create(&NewClip {
                team_id: draft.team_id,
                event_id: draft.event_id,
                uploader_id: draft.uploader_id,
                uploader_name: draft.uploader_name,
                name,
                storage_key: key.clone(),
                content_type: draft.content_type.to_string(),
                file_size: draft.file_size,
                approval_status: draft.approval_status,
                index,
                upload_link_id: draft.upload_link_id,
            })
            .await?;

        tracing::info!(
            clip_id = clip.id,
            team_id = clip.team_id,
            event_id = clip.event_id,
            storage_key = %key,
            approval = %clip.approval_status,
            "Upload presigned"
        );

        Ok(PresignUploadResponse {
            clip_id: clip.id,
            key,
            presigned_url,
            expires_at,
            index,
        })
    }

    /// `uploading -> uploaded` once the object exists. Repeats are no-ops.
    async fn confirm_clip(&self, clip: Clip) -> Result<Clip, AppError> {
        match clip.status {
            ClipStatus::Uploading => {}
            ClipStatus::Uploaded => return Ok(clip),
            other => {
                return Err(AppError::InvalidState(format!(
                    "Clip {} is {}, expected uploading",
                    clip.id, other
                )))
            }
        }

        if !self.storage.exists(&clip.storage_key).await? {
            return Err(AppError::NotFound(format!(
                "Upload for clip {} not found in storage",
                clip.id
            )));
        }

        if !self.clips.mark_uploaded(clip.id).await? {
            tracing::debug!(clip_id = clip.id, "Clip confirmed concurrently");
        }
        tracing::info!(clip_id = clip.id, "Upload confirmed");

        self.clip_service.require(clip.team_id, clip.id).await
    }
}
