//! Coach-side management of upload links and share links.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use kolla_core::models::{CreateLinkRequest, ShareTarget, UploadLink};

use crate::auth::AuthenticatedActor;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v0/events/{event_id}/upload-links",
    tag = "links",
    params(("event_id" = i64, Path, description = "Event ID")),
    request_body = CreateLinkRequest,
    responses(
        (status = 201, description = "Upload link created", body = UploadLink),
        (status = 400, description = "expiresInHours out of range", body = ErrorResponse),
        (status = 403, description = "Coach role required", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, actor, request),
    fields(team_id = actor.team_id, operation = "create_upload_link")
)]
pub async fn create_upload_link(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<CreateLinkRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let link = state.upload_links.create(&actor, event_id, request).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

#[utoipa::path(
    get,
    path = "/api/v0/events/{event_id}/upload-links",
    tag = "links",
    params(("event_id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Upload links, newest first", body = [UploadLink]),
        (status = 403, description = "Coach role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_upload_links(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.upload_links.list(&actor, event_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v0/upload-links/{link_id}",
    tag = "links",
    params(("link_id" = i64, Path, description = "Upload link ID")),
    responses(
        (status = 204, description = "Link revoked; clips already uploaded stay"),
        (status = 403, description = "Coach role required", body = ErrorResponse),
        (status = 404, description = "Link not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn revoke_upload_link(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(link_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.upload_links.revoke(&actor, link_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_share(
    state: &AppState,
    actor: &AuthenticatedActor,
    target: ShareTarget,
    request: CreateLinkRequest,
) -> Result<impl IntoResponse, HttpAppError> {
    let link = state.share_links.create(actor, target, request).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

#[utoipa::path(
    post,
    path = "/api/v0/events/{event_id}/share-links",
    tag = "links",
    params(("event_id" = i64, Path, description = "Event ID")),
    request_body = CreateLinkRequest,
    responses(
        (status = 201, description = "Share link created; no expiry unless expiresInHours is set"),
        (status = 403, description = "Coach role required", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_event_share(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<CreateLinkRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    create_share(&state, &actor, ShareTarget::Event(event_id), request).await
}

#[utoipa::path(
    get,
    path = "/api/v0/events/{event_id}/share-links",
    tag = "links",
    params(("event_id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Share links for the event"),
        (status = 403, description = "Coach role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_event_shares(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(
        state
            .share_links
            .list(&actor, ShareTarget::Event(event_id))
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v0/events/{event_id}/share-links/{link_id}",
    tag = "links",
    params(
        ("event_id" = i64, Path, description = "Event ID"),
        ("link_id" = i64, Path, description = "Share link ID")
    ),
    responses(
        (status = 204, description = "Share link revoked"),
        (status = 404, description = "Link not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn revoke_event_share(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path((event_id, link_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .share_links
        .revoke(&actor, ShareTarget::Event(event_id), link_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v0/playlists/{playlist_id}/share-links",
    tag = "links",
    params(("playlist_id" = i64, Path, description = "Playlist ID")),
    request_body = CreateLinkRequest,
    responses(
        (status = 201, description = "Share link created"),
        (status = 403, description = "Coach role required", body = ErrorResponse),
        (status = 404, description = "Playlist not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_playlist_share(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<CreateLinkRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    create_share(&state, &actor, ShareTarget::Playlist(playlist_id), request).await
}

#[utoipa::path(
    get,
    path = "/api/v0/playlists/{playlist_id}/share-links",
    tag = "links",
    params(("playlist_id" = i64, Path, description = "Playlist ID")),
    responses(
        (status = 200, description = "Share links for the playlist"),
        (status = 403, description = "Coach role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_playlist_shares(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(
        state
            .share_links
            .list(&actor, ShareTarget::Playlist(playlist_id))
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v0/playlists/{playlist_id}/share-links/{link_id}",
    tag = "links",
    params(
        ("playlist_id" = i64, Path, description = "Playlist ID"),
        ("link_id" = i64, Path, description = "Share link ID")
    ),
    responses(
        (status = 204, description = "Share link revoked"),
        (status = 404, description = "Link not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn revoke_playlist_share(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path((playlist_id, link_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .share_links
        .revoke(&actor, ShareTarget::Playlist(playlist_id), link_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
