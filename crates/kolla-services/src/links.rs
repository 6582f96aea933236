//! Tokenized links: upload links grant write access to one event, share
//! links grant read access to an event or a playlist.

use chrono::{DateTime, Duration, Utc};
use kolla_core::{
    models::{
        ClipResponse, CreateLinkRequest, Event, EventKind, Playlist, PlaylistItemRef,
        Segment, ShareLink, ShareTarget, UploadLink,
    },
    Actor, AppError,
};
use kolla_db::{
    ClipRepository, EventRepository, PlaylistRepository, SegmentRepository, ShareLinkRepository,
    UploadLinkRepository,
};
use serde::Serialize;

use crate::clips::ClipService;
use crate::tokens::generate_token;

/// Upper bound for `expiresInHours` on any link.
pub const MAX_LINK_HOURS: i64 = 24 * 365;

fn link_lifetime(hours: i64) -> Result<Duration, AppError> {
    if !(1..=MAX_LINK_HOURS).contains(&hours) {
        return Err(AppError::InvalidInput(format!(
            "expiresInHours must be between 1 and {}",
            MAX_LINK_HOURS
        )));
    }
    Ok(Duration::hours(hours))
}

/// Look up an upload link that may still be used at `now`.
///
/// Unknown and expired tokens fail the same way so tokens cannot be guessed at.
pub async fn require_active_upload_link(
    links: &UploadLinkRepository,
    token: &str,
    now: DateTime<Utc>,
) -> Result<UploadLink, AppError> {
    match links.find_by_token(token).await? {
        Some(link) if !link.is_expired(now) => Ok(link),
        _ => Err(AppError::Expired(
            "Upload link is invalid or has expired".to_string(),
        )),
    }
}

/// What an upload-link holder sees before uploading.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadLinkInfo {
    pub event_id: i64,
    pub event_name: String,
    pub event_kind: EventKind,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct UploadLinkService {
    links: UploadLinkRepository,
    events: EventRepository,
    default_hours: i64,
}

impl UploadLinkService {
    pub fn new(links: UploadLinkRepository, events: EventRepository, default_hours: i64) -> Self {
        Self {
            links,
            events,
            default_hours,
        }
    }

    async fn require_event(&self, team_id: i64, event_id: i64) -> Result<Event, AppError> {
        self.events
            .get(team_id, event_id)
            .await?
            .ok_or_else(|| AppError::not_found("Event", event_id))
    }

    #[tracing::instrument(skip(self, actor, request), fields(team_id = actor.team_id))]
    pub async fn create(
        &self,
        actor: &Actor,
        event_id: i64,
        request: CreateLinkRequest,
    ) -> Result<UploadLink, AppError> {
        actor.require_coach("create upload links")?;
        self.require_event(actor.team_id, event_id).await?;
        let lifetime = link_lifetime(request.expires_in_hours.unwrap_or(self.default_hours))?;

        let link = self
            .links
            .create(
                actor.team_id,
                event_id,
                &generate_token(),
                Utc::now() + lifetime,
                actor.user_id,
            )
            .await?;
        tracing::info!(link_id = link.id, event_id, expires_at = %link.expires_at, "Upload link created");
        Ok(link)
    }

    pub async fn list(&self, actor: &Actor, event_id: i64) -> Result<Vec<UploadLink>, AppError> {
        actor.require_coach("view upload links")?;
        self.require_event(actor.team_id, event_id).await?;
        self.links.list_by_event(actor.team_id, event_id).await
    }

    pub async fn revoke(&self, actor: &Actor, link_id: i64) -> Result<(), AppError> {
        actor.require_coach("revoke upload links")?;
        if !self.links.delete(actor.team_id, link_id).await? {
            return Err(AppError::not_found("Upload link", link_id));
        }
        Ok(())
    }

    pub async fn resolve(&self, token: &str) -> Result<UploadLinkInfo, AppError> {
        let link = require_active_upload_link(&self.links, token, Utc::now()).await?;
        let event = self.require_event(link.team_id, link.event_id).await?;
        Ok(UploadLinkInfo {
            event_id: event.id,
            event_name: event.name,
            event_kind: event.kind,
            expires_at: link.expires_at,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedPlaylistItem {
    pub id: i64,
    pub position: i64,
    pub clip: ClipResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<Segment>,
}

/// Public view behind a share link.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SharedContent {
    Event {
        event: Event,
        clips: Vec<ClipResponse>,
    },
    Playlist {
        playlist: Playlist,
        items: Vec<SharedPlaylistItem>,
    },
}

#[derive(Clone)]
pub struct ShareLinkService {
    links: ShareLinkRepository,
    events: EventRepository,
    playlists: PlaylistRepository,
    clips: ClipRepository,
    segments: SegmentRepository,
    clip_service: ClipService,
}

impl ShareLinkService {
    pub fn new(
        links: ShareLinkRepository,
        events: EventRepository,
        playlists: PlaylistRepository,
        clips: ClipRepository,
        segments: SegmentRepository,
        clip_service: ClipService,
    ) -> Self {
        Self {
            links,
            events,
            playlists,
            clips,
            segments,
            clip_service,
        }
    }

    async fn require_target(&self, team_id: i64, target: ShareTarget) -> Result<(), AppError> {
        let exists = match target {
            ShareTarget::Event(id) => self.events.get(team_id, id).await?.is_some(),
            ShareTarget::Playlist(id) => self.playlists.get(team_id, id).await?.is_some(),
        };
        if exists {
            return Ok(());
        }
        Err(match target {
            ShareTarget::Event(id) => AppError::not_found("Event", id),
            ShareTarget::Playlist(id) => AppError::not_found("Playlist", id),
        })
    }

    #[tracing::instrument(skip(self, actor, request), fields(team_id = actor.team_id))]
    pub async fn create(
        &self,
        actor: &Actor,
        target: ShareTarget,
        request: CreateLinkRequest,
    ) -> Result<ShareLink, AppError> {
        actor.require_coach("create share links")?;
        self.require_target(actor.team_id, target).await?;
        let expires_at = request
            .expires_in_hours
            .map(link_lifetime)
            .transpose()?
            .map(|lifetime| Utc::now() + lifetime);

        let link = self
            .links
            .create(actor.team_id, target, &generate_token(), expires_at, actor.user_id)
            .await?;
        tracing::info!(link_id = link.id, "Share link created");
        Ok(link)
    }

    pub async fn list(&self, actor: &Actor, target: ShareTarget) -> Result<Vec<ShareLink>, AppError> {
        actor.require_coach("view share links")?;
        self.require_target(actor.team_id, target).await?;
        self.links.list_for(actor.team_id, target).await
    }

    pub async fn revoke(&self, actor: &Actor, target: ShareTarget, link_id: i64) -> Result<(), AppError> {
        actor.require_coach("revoke share links")?;
        if !self.links.delete(actor.team_id, target, link_id).await? {
            return Err(AppError::not_found("Share link", link_id));
        }
        Ok(())
    }

    /// Public resolution. Event shares expose approved, ready clips only.
    #[tracing::instrument(skip(self, token))]
    pub async fn resolve(&self, token: &str) -> Result<SharedContent, AppError> {
        let link = self
            .links
            .find_by_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Share link not found".to_string()))?;
        if link.is_expired(Utc::now()) {
            return Err(AppError::Expired("Share link has expired".to_string()));
        }

        match link.target {
            ShareTarget::Event(event_id) => {
                let event = self
                    .events
                    .get(link.team_id, event_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Event", event_id))?;
                let clips = self
                    .clips
                    .list_by_event(link.team_id, event_id, true)
                    .await?
                    .into_iter()
                    .filter(|clip| clip.is_shareable())
                    .collect();
                Ok(SharedContent::Event {
                    event,
                    clips: self.clip_service.to_responses(clips).await?,
                })
            }
            ShareTarget::Playlist(playlist_id) => {
                let playlist = self
                    .playlists
                    .get(link.team_id, playlist_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Playlist", playlist_id))?;
                let items = self.shared_items(link.team_id, playlist_id).await?;
                Ok(SharedContent::Playlist { playlist, items })
            }
        }
    }

    async fn shared_items(
        &self,
        team_id: i64,
        playlist_id: i64,
    ) -> Result<Vec<SharedPlaylistItem>, AppError> {
        let items = self.playlists.list_items(playlist_id).await?;
        let mut out = Vec::with_capacity(items.len());

        for item in items {
            let (clip_id, segment) = match item.item {
                PlaylistItemRef::Clip(clip_id) => (clip_id, None),
                PlaylistItemRef::Segment(segment_id) => {
                    let Some(segment) = self.segments.get(team_id, segment_id).await? else {
                        continue;
                    };
                    (segment.clip_id, Some(segment))
                }
            };
            // Same rule as an event share: approved and playable, or left out.
            let Some(clip) = self
                .clips
                .get(team_id, clip_id)
                .await?
                .filter(|clip| clip.is_shareable())
            else {
                continue;
            };
            out.push(SharedPlaylistItem {
                id: item.id,
                position: item.position,
                clip: self.clip_service.to_response(clip).await?,
                segment,
            });
        }

        Ok(out)
    }
}
