//! Repository and service wiring

use std::sync::Arc;

use kolla_core::Config;
use kolla_db::{
    ClipRepository, CommentRepository, EventRepository, PlaylistRepository, SegmentRepository,
    ShareLinkRepository, SqlitePool, UploadLinkRepository,
};
use kolla_services::{
    ApprovalService, ClipLifecycle, ClipService, CommentService, EventService, PlaylistService,
    SegmentService, ServiceSettings, ShareLinkService, TranscodingService, UploadLinkService,
    UploadService, WebhookReceiver,
};
use kolla_storage::Storage;
use kolla_transcoding::TranscodingProvider;

use crate::auth::{AuthState, JwtService};
use crate::state::AppState;

/// Build every service over one pool, one object store and one provider.
pub fn initialize_services(
    config: &Config,
    pool: SqlitePool,
    storage: Arc<dyn Storage>,
    provider: Arc<dyn TranscodingProvider>,
) -> Arc<AppState> {
    let settings = ServiceSettings::from_config(config);

    let clip_repo = ClipRepository::new(pool.clone());
    let event_repo = EventRepository::new(pool.clone());
    let segment_repo = SegmentRepository::new(pool.clone());
    let playlist_repo = PlaylistRepository::new(pool.clone());
    let upload_link_repo = UploadLinkRepository::new(pool.clone());
    let share_link_repo = ShareLinkRepository::new(pool.clone());
    let comment_repo = CommentRepository::new(pool.clone());

    let lifecycle = ClipLifecycle::new(storage.clone(), provider.clone());
    let clips = ClipService::new(
        clip_repo.clone(),
        event_repo.clone(),
        storage.clone(),
        lifecycle.clone(),
        settings.playback_url_ttl,
    );
    let transcoding =
        TranscodingService::new(clip_repo.clone(), storage.clone(), provider.clone(), &settings);
    let uploads = UploadService::new(
        clip_repo.clone(),
        upload_link_repo.clone(),
        clips.clone(),
        transcoding,
        storage,
        &settings,
    );
    let webhooks = WebhookReceiver::new(
        clip_repo.clone(),
        provider,
        settings.processing_callback_secret.clone(),
    );

    tracing::info!(webhook_url = %settings.webhook_url, "Services initialized");

    Arc::new(AppState {
        config: config.clone(),
        pool,
        auth: Arc::new(AuthState {
            jwt: JwtService::new(config.jwt_secret()),
        }),
        approval: ApprovalService::new(clip_repo.clone(), clips.clone()),
        events: EventService::new(event_repo.clone(), clip_repo.clone(), lifecycle),
        segments: SegmentService::new(segment_repo.clone(), clip_repo.clone()),
        playlists: PlaylistService::new(
            playlist_repo.clone(),
            clip_repo.clone(),
            segment_repo.clone(),
        ),
        upload_links: UploadLinkService::new(
            upload_link_repo,
            event_repo.clone(),
            settings.upload_link_default_hours,
        ),
        share_links: ShareLinkService::new(
            share_link_repo,
            event_repo,
            playlist_repo,
            clip_repo.clone(),
            segment_repo.clone(),
            clips.clone(),
        ),
        comments: CommentService::new(comment_repo, clip_repo, segment_repo),
        uploads,
        webhooks,
        clips,
    })
}
