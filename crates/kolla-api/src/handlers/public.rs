//! Unauthenticated surfaces reached through share and upload link tokens.
//!
//! Tokens are never recorded in spans or logs.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use kolla_core::{
    models::{
        ClipResponse, PresignUploadResponse, PublicPresignRequest, ReserveIndicesRequest,
        ReserveIndicesResponse,
    },
    AppError,
};
use kolla_services::SharedContent;
use validator::Validate;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v0/public/share/{token}",
    tag = "public",
    params(("token" = String, Path, description = "Share link token")),
    responses(
        (status = 200, description = "Shared event or playlist, tagged by kind"),
        (status = 403, description = "Link expired", body = ErrorResponse),
        (status = 404, description = "Unknown link", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token), fields(operation = "resolve_share"))]
pub async fn resolve_share(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.share_links.resolve(&token).await?))
}

#[utoipa::path(
    get,
    path = "/api/v0/public/playlists/{token}",
    tag = "public",
    params(("token" = String, Path, description = "Playlist share token")),
    responses(
        (status = 200, description = "Shared playlist with items in position order"),
        (status = 403, description = "Link expired", body = ErrorResponse),
        (status = 404, description = "Unknown link, or the link shares an event", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token), fields(operation = "resolve_playlist_share"))]
pub async fn resolve_playlist_share(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    match state.share_links.resolve(&token).await? {
        content @ SharedContent::Playlist { .. } => Ok(Json(content)),
        SharedContent::Event { .. } => {
            Err(AppError::NotFound("Share link not found".to_string()).into())
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v0/public/upload-links/{token}",
    tag = "public",
    params(("token" = String, Path, description = "Upload link token")),
    responses(
        (status = 200, description = "Event the link uploads into"),
        (status = 403, description = "Link unknown or expired", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token), fields(operation = "resolve_upload_link"))]
pub async fn resolve_upload_link(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.upload_links.resolve(&token).await?))
}

#[utoipa::path(
    post,
    path = "/api/v0/public/upload-links/{token}/presign",
    tag = "public",
    params(("token" = String, Path, description = "Upload link token")),
    request_body = PublicPresignRequest,
    responses(
        (status = 201, description = "Pending clip created", body = PresignUploadResponse),
        (status = 400, description = "Content type, size or uploader name rejected", body = ErrorResponse),
        (status = 403, description = "Link unknown or expired", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token, request), fields(operation = "presign_with_link"))]
pub async fn presign_with_link(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    ValidatedJson(request): ValidatedJson<PublicPresignRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    let response = state.uploads.presign_with_link(&token, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/v0/public/upload-links/{token}/reserve-indices",
    tag = "public",
    params(("token" = String, Path, description = "Upload link token")),
    request_body = ReserveIndicesRequest,
    responses(
        (status = 200, description = "Reserved block", body = ReserveIndicesResponse),
        (status = 403, description = "Link unknown or expired", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, token, request),
    fields(count = request.count, operation = "reserve_with_link")
)]
pub async fn reserve_with_link(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    ValidatedJson(request): ValidatedJson<ReserveIndicesRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let start = state.uploads.reserve_with_link(&token, request.count).await?;
    Ok(Json(ReserveIndicesResponse {
        start,
        count: request.count,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v0/public/upload-links/{token}/clips/{clip_id}/confirm",
    tag = "public",
    params(
        ("token" = String, Path, description = "Upload link token"),
        ("clip_id" = i64, Path, description = "Clip created through this link")
    ),
    responses(
        (status = 200, description = "Upload confirmed", body = ClipResponse),
        (status = 403, description = "Link unknown or expired", body = ErrorResponse),
        (status = 404, description = "Clip not found for this link", body = ErrorResponse),
        (status = 409, description = "Clip is past the upload stage", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token), fields(operation = "confirm_with_link"))]
pub async fn confirm_with_link(
    State(state): State<Arc<AppState>>,
    Path((token, clip_id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, HttpAppError> {
    let clip = state.uploads.confirm_with_link(&token, clip_id).await?;
    Ok(Json(state.clips.to_response(clip).await?))
}

#[utoipa::path(
    post,
    path = "/api/v0/public/upload-links/{token}/clips/{clip_id}/process",
    tag = "public",
    params(
        ("token" = String, Path, description = "Upload link token"),
        ("clip_id" = i64, Path, description = "Clip created through this link")
    ),
    responses(
        (status = 202, description = "Transcoding job submitted", body = ClipResponse),
        (status = 403, description = "Link unknown or expired", body = ErrorResponse),
        (status = 409, description = "Clip is not in the uploaded state", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token), fields(operation = "process_with_link"))]
pub async fn process_with_link(
    State(state): State<Arc<AppState>>,
    Path((token, clip_id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, HttpAppError> {
    let clip = state.uploads.enqueue_with_link(&token, clip_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(state.clips.to_response(clip).await?),
    ))
}
