//! Approval gate for clips that arrive through public upload links.

use kolla_core::{models::ClipResponse, Actor, AppError};
use kolla_db::ClipRepository;

use crate::clips::ClipService;

#[derive(Clone)]
pub struct ApprovalService {
    clips: ClipRepository,
    clip_service: ClipService,
}

impl ApprovalService {
    pub fn new(clips: ClipRepository, clip_service: ClipService) -> Self {
        Self {
            clips,
            clip_service,
        }
    }

    /// Approved clips of an event, in index order. Any team member.
    pub async fn listing(&self, actor: &Actor, event_id: i64) -> Result<Vec<ClipResponse>, AppError> {
        self.clip_service.require_event(actor.team_id, event_id).await?;
        let clips = self.clips.list_by_event(actor.team_id, event_id, true).await?;
        self.clip_service.to_responses(clips).await
    }

    /// Clips awaiting review. Coaches only.
    pub async fn pending_listing(
        &self,
        actor: &Actor,
        event_id: i64,
    ) -> Result<Vec<ClipResponse>, AppError> {
        actor.require_coach("review pending clips")?;
        self.clip_service.require_event(actor.team_id, event_id).await?;
        let clips = self.clips.list_pending(actor.team_id, event_id).await?;
        self.clip_service.to_responses(clips).await
    }

    /// Approve a batch. Unknown ids abort the batch before anything is written.
    #[tracing::instrument(skip(self, actor, clip_ids), fields(team_id = actor.team_id, count = clip_ids.len()))]
    pub async fn approve(&self, actor: &Actor, clip_ids: &[i64]) -> Result<Vec<i64>, AppError> {
        actor.require_coach("approve clips")?;
        if clip_ids.is_empty() {
            return Err(AppError::InvalidInput(
                "clipIds must not be empty".to_string(),
            ));
        }

        let mut ids = clip_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let approved = self.clips.approve(actor.team_id, &ids).await?;
        tracing::info!(team_id = actor.team_id, count = approved.len(), "Clips approved");
        Ok(approved)
    }

    /// Reject a clip: its objects and its row are removed.
    #[tracing::instrument(skip(self, actor), fields(team_id = actor.team_id))]
    pub async fn reject(&self, actor: &Actor, clip_id: i64) -> Result<(), AppError> {
        actor.require_coach("reject clips")?;
        let clip = self.clip_service.require(actor.team_id, clip_id).await?;
        self.clip_service.remove(&clip).await
    }
}
