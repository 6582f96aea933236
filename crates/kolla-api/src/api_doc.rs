//! OpenAPI documentation, served at /api/openapi.json and rendered at /docs.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use kolla_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kolla API",
        version = "0.1.0",
        description = "Video review for teams: clip ingestion through presigned uploads, transcoding to HLS, approval of link uploads, segments, playlists and share links. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::health::health_check,
        // Events
        handlers::events::create_event,
        handlers::events::list_events,
        handlers::events::get_event,
        handlers::events::delete_event,
        // Clips
        handlers::clips::list_event_clips,
        handlers::clips::list_pending_clips,
        handlers::clips::reorder_clips,
        handlers::clips::reserve_indices,
        handlers::clips::get_clip,
        handlers::clips::update_clip,
        handlers::clips::delete_clip,
        handlers::clips::approve_clips,
        handlers::clips::reject_clip,
        // Uploads
        handlers::uploads::presign_upload,
        handlers::uploads::confirm_upload,
        handlers::uploads::enqueue_processing,
        // Segments
        handlers::segments::create_segment,
        handlers::segments::list_segments,
        handlers::segments::reorder_segments,
        handlers::segments::get_segment,
        handlers::segments::update_segment,
        handlers::segments::delete_segment,
        // Comments
        handlers::comments::add_comment,
        handlers::comments::list_comments,
        handlers::comments::delete_comment,
        // Playlists
        handlers::playlists::create_playlist,
        handlers::playlists::list_playlists,
        handlers::playlists::get_playlist,
        handlers::playlists::rename_playlist,
        handlers::playlists::delete_playlist,
        handlers::playlists::add_playlist_item,
        handlers::playlists::remove_playlist_item,
        handlers::playlists::reorder_playlist_items,
        // Links
        handlers::links::create_upload_link,
        handlers::links::list_upload_links,
        handlers::links::revoke_upload_link,
        handlers::links::create_event_share,
        handlers::links::list_event_shares,
        handlers::links::revoke_event_share,
        handlers::links::create_playlist_share,
        handlers::links::list_playlist_shares,
        handlers::links::revoke_playlist_share,
        // Public
        handlers::public::resolve_share,
        handlers::public::resolve_playlist_share,
        handlers::public::resolve_upload_link,
        handlers::public::presign_with_link,
        handlers::public::reserve_with_link,
        handlers::public::confirm_with_link,
        handlers::public::process_with_link,
        // Callbacks
        handlers::callbacks::processing_callback,
        handlers::callbacks::webhook_ping,
        handlers::callbacks::transcoding_webhook,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,
            models::Team,
            models::TeamRole,
            models::Event,
            models::EventKind,
            models::CreateEventRequest,
            models::ClipResponse,
            models::ClipStatus,
            models::ApprovalStatus,
            models::UpdateClipRequest,
            models::ApproveClipsRequest,
            models::ApproveClipsResponse,
            models::ReorderRequest,
            models::ReserveIndicesRequest,
            models::ReserveIndicesResponse,
            models::PresignUploadRequest,
            models::PublicPresignRequest,
            models::PresignUploadResponse,
            models::ProcessingCallback,
            models::CallbackAck,
            models::Segment,
            models::CreateSegmentRequest,
            models::UpdateSegmentRequest,
            models::Comment,
            models::CreateCommentRequest,
            models::Playlist,
            models::CreatePlaylistRequest,
            models::AddPlaylistItemRequest,
            models::UploadLink,
            models::CreateLinkRequest,
            error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness and database reachability"),
        (name = "events", description = "Games and practices that own clips"),
        (name = "clips", description = "Clip reads, edits, ordering and the approval gate"),
        (name = "uploads", description = "Presigned upload, confirmation and transcoding hand-off"),
        (name = "segments", description = "Named time ranges inside a clip"),
        (name = "comments", description = "Threaded comments on clips and segments"),
        (name = "playlists", description = "Ordered collections of clips and segments"),
        (name = "links", description = "Upload links and share links"),
        (name = "public", description = "Token-scoped access without a bearer token"),
        (name = "callbacks", description = "Processing job callback and transcoder webhooks")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
