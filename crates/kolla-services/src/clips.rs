//! Team-facing clip operations.

use std::sync::Arc;
use std::time::Duration;

use kolla_core::{
    models::{Clip, ClipResponse, UpdateClipRequest},
    validation, Actor, AppError,
};
use kolla_db::{ClipRepository, EventRepository};
use kolla_storage::Storage;

use crate::lifecycle::ClipLifecycle;

/// Largest block one upload batch may reserve.
pub const MAX_RESERVED_INDICES: i64 = 1000;

#[derive(Clone)]
pub struct ClipService {
    clips: ClipRepository,
    events: EventRepository,
    storage: Arc<dyn Storage>,
    lifecycle: ClipLifecycle,
    playback_url_ttl: Duration,
}

impl ClipService {
    pub fn new(
        clips: ClipRepository,
        events: EventRepository,
        storage: Arc<dyn Storage>,
        lifecycle: ClipLifecycle,
        playback_url_ttl: Duration,
    ) -> Self {
        Self {
            clips,
            events,
            storage,
            lifecycle,
            playback_url_ttl,
        }
    }

    /// Response body with a presigned playback URL when the clip is ready.
    pub async fn to_response(&self, clip: Clip) -> Result<ClipResponse, AppError> {
        let playback_url = match clip.master_playlist_key() {
            Some(key) => Some(
                self.storage
                    .presign_get(&key, self.playback_url_ttl)
                    .await?,
            ),
            None => None,
        };
        Ok(ClipResponse::new(clip, playback_url))
    }

    pub async fn to_responses(&self, clips: Vec<Clip>) -> Result<Vec<ClipResponse>, AppError> {
        let mut out = Vec::with_capacity(clips.len());
        for clip in clips {
            out.push(self.to_response(clip).await?);
        }
        Ok(out)
    }

    /// Team-scoped lookup. Foreign and missing ids look the same.
    pub async fn require(&self, team_id: i64, clip_id: i64) -> Result<Clip, AppError> {
        self.clips
            .get(team_id, clip_id)
            .await?
            .ok_or_else(|| AppError::not_found("Clip", clip_id))
    }

    /// [`ClipService::require`] for a team member. Clips awaiting approval
    /// only exist for coaches.
    pub async fn require_visible(&self, actor: &Actor, clip_id: i64) -> Result<Clip, AppError> {
        let clip = self.require(actor.team_id, clip_id).await?;
        if !clip.visible_to(actor) {
            return Err(AppError::not_found("Clip", clip_id));
        }
        Ok(clip)
    }

    pub async fn require_event(&self, team_id: i64, event_id: i64) -> Result<(), AppError> {
        self.events
            .get(team_id, event_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("Event", event_id))
    }

    pub async fn get(&self, actor: &Actor, clip_id: i64) -> Result<ClipResponse, AppError> {
        let clip = self.require_visible(actor, clip_id).await?;
        self.to_response(clip).await
    }

    #[tracing::instrument(skip(self, actor, request), fields(team_id = actor.team_id, clip_id))]
    pub async fn update(
        &self,
        actor: &Actor,
        clip_id: i64,
        request: UpdateClipRequest,
    ) -> Result<ClipResponse, AppError> {
        self.require_visible(actor, clip_id).await?;

        if let Some(name) = request.name.as_deref() {
            let name = validation::validate_name("name", name)?;
            self.clips.rename(actor.team_id, clip_id, &name).await?;
        }
        if let Some(tags) = request.tags.as_deref() {
            let tags = validation::normalize_tags(tags)?;
            self.clips.set_tags(actor.team_id, clip_id, &tags).await?;
        }

        self.get(actor, clip_id).await
    }

    /// Coaches may delete any clip, players only their own.
    #[tracing::instrument(skip(self, actor), fields(team_id = actor.team_id, clip_id))]
    pub async fn delete(&self, actor: &Actor, clip_id: i64) -> Result<(), AppError> {
        let clip = self.require_visible(actor, clip_id).await?;
        if !actor.is_coach() && clip.uploader_id != Some(actor.user_id) {
            return Err(AppError::Forbidden(
                "Only coaches or the uploader can delete a clip".to_string(),
            ));
        }
        self.remove(&clip).await
    }

    /// Storage cleanup, then the row. No authorization check.
    pub(crate) async fn remove(&self, clip: &Clip) -> Result<(), AppError> {
        self.lifecycle.delete_artifacts(clip).await;
        if !self.clips.delete(clip.team_id, clip.id).await? {
            return Err(AppError::not_found("Clip", clip.id));
        }
        tracing::info!(clip_id = clip.id, team_id = clip.team_id, "Clip deleted");
        Ok(())
    }

    pub async fn reorder(&self, actor: &Actor, event_id: i64, ids: &[i64]) -> Result<(), AppError> {
        actor.require_coach("reorder clips")?;
        self.require_event(actor.team_id, event_id).await?;
        self.clips.reorder(actor.team_id, event_id, ids).await
    }

    /// First index of a freshly reserved block of `count`.
    pub async fn reserve_indices(
        &self,
        team_id: i64,
        event_id: i64,
        count: i64,
    ) -> Result<i64, AppError> {
        if count > MAX_RESERVED_INDICES {
            return Err(AppError::InvalidInput(format!(
                "count must be at most {}",
                MAX_RESERVED_INDICES
            )));
        }
        self.clips
            .reserve_indices(team_id, event_id, count)
            .await?
            .ok_or_else(|| AppError::not_found("Event", event_id))
    }
}
