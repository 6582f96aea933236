//! Authenticated upload flow: presign, then confirm once the PUT landed,
//! then hand the clip to the transcoder.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use kolla_core::models::{ClipResponse, PresignUploadRequest, PresignUploadResponse};
use validator::Validate;

use crate::auth::AuthenticatedActor;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v0/uploads/presign",
    tag = "uploads",
    request_body = PresignUploadRequest,
    responses(
        (status = 201, description = "Clip row created, PUT the bytes to presignedUrl", body = PresignUploadResponse),
        (status = 400, description = "Content type, size or index rejected", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 502, description = "Object store unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, actor, request),
    fields(team_id = actor.team_id, event_id = request.event_id, operation = "presign_upload")
)]
pub async fn presign_upload(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<PresignUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    let response = state.uploads.presign(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/v0/clips/{clip_id}/confirm",
    tag = "uploads",
    params(("clip_id" = i64, Path, description = "Clip ID")),
    responses(
        (status = 200, description = "Upload confirmed", body = ClipResponse),
        (status = 404, description = "Clip or uploaded object not found", body = ErrorResponse),
        (status = 409, description = "Clip is past the upload stage", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, actor),
    fields(team_id = actor.team_id, operation = "confirm_upload")
)]
pub async fn confirm_upload(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let clip = state.uploads.confirm(&actor, clip_id).await?;
    Ok(Json(state.clips.to_response(clip).await?))
}

#[utoipa::path(
    post,
    path = "/api/v0/clips/{clip_id}/process",
    tag = "uploads",
    params(("clip_id" = i64, Path, description = "Clip ID")),
    responses(
        (status = 202, description = "Transcoding job submitted", body = ClipResponse),
        (status = 404, description = "Clip not found", body = ErrorResponse),
        (status = 409, description = "Clip is not in the uploaded state", body = ErrorResponse),
        (status = 502, description = "Provider rejected the job; clip marked failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, actor),
    fields(team_id = actor.team_id, operation = "enqueue_processing")
)]
pub async fn enqueue_processing(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let clip = state.uploads.enqueue_processing(&actor, clip_id).await?;
    Ok((StatusCode::ACCEPTED, Json(state.clips.to_response(clip).await?)))
}
