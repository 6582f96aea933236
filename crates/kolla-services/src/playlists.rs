//! Curated playlists of clips and segments.
//!
//! Positions are dense and 0-based; the repository keeps them that way on
//! every mutation, including deletes of the clips and segments they point at.

use kolla_core::{
    models::{
        AddPlaylistItemRequest, ApprovalStatus, CreatePlaylistRequest, Playlist, PlaylistItem, PlaylistItemRef,
        PlaylistWithItems,
    },
    validation, Actor, AppError,
};
use kolla_db::{ClipRepository, PlaylistRepository, SegmentRepository};

#[derive(Clone)]
pub struct PlaylistService {
    playlists: PlaylistRepository,
    clips: ClipRepository,
    segments: SegmentRepository,
}

impl PlaylistService {
    pub fn new(
        playlists: PlaylistRepository,
        clips: ClipRepository,
        segments: SegmentRepository,
    ) -> Self {
        Self {
            playlists,
            clips,
            segments,
        }
    }

    async fn require(&self, team_id: i64, playlist_id: i64) -> Result<Playlist, AppError> {
        self.playlists
            .get(team_id, playlist_id)
            .await?
            .ok_or_else(|| AppError::not_found("Playlist", playlist_id))
    }

    pub async fn create(
        &self,
        actor: &Actor,
        request: CreatePlaylistRequest,
    ) -> Result<Playlist, AppError> {
        let name = validation::validate_name("name", &request.name)?;
        self.playlists.create(actor.team_id, &name).await
    }

    pub async fn list(&self, actor: &Actor) -> Result<Vec<Playlist>, AppError> {
        self.playlists.list(actor.team_id).await
    }

    pub async fn get(&self, actor: &Actor, playlist_id: i64) -> Result<PlaylistWithItems, AppError> {
        let playlist = self.require(actor.team_id, playlist_id).await?;
        let items = self.playlists.list_items(playlist_id).await?;
        Ok(PlaylistWithItems { playlist, items })
    }

    pub async fn rename(
        &self,
        actor: &Actor,
        playlist_id: i64,
        name: &str,
    ) -> Result<Playlist, AppError> {
        let name = validation::validate_name("name", name)?;
        if !self.playlists.rename(actor.team_id, playlist_id, &name).await? {
            return Err(AppError::not_found("Playlist", playlist_id));
        }
        self.require(actor.team_id, playlist_id).await
    }

    pub async fn delete(&self, actor: &Actor, playlist_id: i64) -> Result<(), AppError> {
        if !self.playlists.delete(actor.team_id, playlist_id).await? {
            return Err(AppError::not_found("Playlist", playlist_id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, actor, request), fields(team_id = actor.team_id))]
    pub async fn add_item(
        &self,
        actor: &Actor,
        playlist_id: i64,
        request: AddPlaylistItemRequest,
    ) -> Result<PlaylistItem, AppError> {
        self.require(actor.team_id, playlist_id).await?;
        let item = PlaylistItemRef::from_parts(request.clip_id, request.segment_id)?;

        // Only the caller's own clips and segments may be referenced.
        let (clip_id, not_found) = match item {
            PlaylistItemRef::Clip(id) => (id, AppError::not_found("Clip", id)),
            PlaylistItemRef::Segment(id) => match self.segments.get(actor.team_id, id).await? {
                Some(segment) => (segment.clip_id, AppError::not_found("Segment", id)),
                None => return Err(AppError::not_found("Segment", id)),
            },
        };
        let clip = match self.clips.get(actor.team_id, clip_id).await? {
            Some(clip) if clip.visible_to(actor) => clip,
            _ => return Err(not_found),
        };
        if clip.approval_status != ApprovalStatus::Approved {
            return Err(AppError::InvalidState(format!(
                "Clip {} is awaiting approval",
                clip.id
            )));
        }

        self.playlists.add_item(playlist_id, item).await
    }

    pub async fn remove_item(
        &self,
        actor: &Actor,
        playlist_id: i64,
        item_id: i64,
    ) -> Result<(), AppError> {
        self.require(actor.team_id, playlist_id).await?;
        if !self.playlists.remove_item(playlist_id, item_id).await? {
            return Err(AppError::NotFound(format!(
                "Item {} not found in playlist {}",
                item_id, playlist_id
            )));
        }
        Ok(())
    }

    pub async fn reorder(
        &self,
        actor: &Actor,
        playlist_id: i64,
        item_ids: &[i64],
    ) -> Result<PlaylistWithItems, AppError> {
        actor.require_coach("reorder playlists")?;
        self.require(actor.team_id, playlist_id).await?;
        self.playlists.reorder(playlist_id, item_ids).await?;
        self.get(actor, playlist_id).await
    }
}
