//! Clip reads and edits, the approval gate and index management.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use kolla_core::models::{
    ApproveClipsRequest, ApproveClipsResponse, ClipResponse, ReorderRequest,
    ReserveIndicesRequest, ReserveIndicesResponse, UpdateClipRequest,
};

use crate::auth::AuthenticatedActor;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v0/events/{event_id}/clips",
    tag = "clips",
    params(("event_id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Approved clips in index order", body = [ClipResponse]),
        (status = 404, description = "Event not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_event_clips(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.approval.listing(&actor, event_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v0/events/{event_id}/clips/pending",
    tag = "clips",
    params(("event_id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Clips awaiting approval", body = [ClipResponse]),
        (status = 403, description = "Coach role required", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_pending_clips(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.approval.pending_listing(&actor, event_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v0/events/{event_id}/clips/order",
    tag = "clips",
    params(("event_id" = i64, Path, description = "Event ID")),
    request_body = ReorderRequest,
    responses(
        (status = 204, description = "Clips re-indexed 1..n"),
        (status = 400, description = "Ids are not a permutation of the event's clips", body = ErrorResponse),
        (status = 403, description = "Coach role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, actor, request),
    fields(team_id = actor.team_id, count = request.ids.len(), operation = "reorder_clips")
)]
pub async fn reorder_clips(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<ReorderRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.clips.reorder(&actor, event_id, &request.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v0/events/{event_id}/clips/reserve-indices",
    tag = "clips",
    params(("event_id" = i64, Path, description = "Event ID")),
    request_body = ReserveIndicesRequest,
    responses(
        (status = 200, description = "Reserved block", body = ReserveIndicesResponse),
        (status = 400, description = "Invalid count", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, actor, request),
    fields(team_id = actor.team_id, count = request.count, operation = "reserve_indices")
)]
pub async fn reserve_indices(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<ReserveIndicesRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let start = state
        .clips
        .reserve_indices(actor.team_id, event_id, request.count)
        .await?;
    Ok(Json(ReserveIndicesResponse {
        start,
        count: request.count,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v0/clips/{clip_id}",
    tag = "clips",
    params(("clip_id" = i64, Path, description = "Clip ID")),
    responses(
        (status = 200, description = "Clip found", body = ClipResponse),
        (status = 404, description = "Clip not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_clip(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.clips.get(&actor, clip_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v0/clips/{clip_id}",
    tag = "clips",
    params(("clip_id" = i64, Path, description = "Clip ID")),
    request_body = UpdateClipRequest,
    responses(
        (status = 200, description = "Clip updated", body = ClipResponse),
        (status = 400, description = "Invalid name or tags", body = ErrorResponse),
        (status = 404, description = "Clip not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_clip(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateClipRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.clips.update(&actor, clip_id, request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v0/clips/{clip_id}",
    tag = "clips",
    params(("clip_id" = i64, Path, description = "Clip ID")),
    responses(
        (status = 204, description = "Clip and its objects deleted"),
        (status = 403, description = "Only coaches or the uploader", body = ErrorResponse),
        (status = 404, description = "Clip not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, actor),
    fields(team_id = actor.team_id, operation = "delete_clip")
)]
pub async fn delete_clip(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.clips.delete(&actor, clip_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v0/clips/approve",
    tag = "clips",
    request_body = ApproveClipsRequest,
    responses(
        (status = 200, description = "Clips approved", body = ApproveClipsResponse),
        (status = 400, description = "Empty batch", body = ErrorResponse),
        (status = 403, description = "Coach role required", body = ErrorResponse),
        (status = 404, description = "A clip is not in the team; nothing was approved", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, actor, request),
    fields(team_id = actor.team_id, count = request.clip_ids.len(), operation = "approve_clips")
)]
pub async fn approve_clips(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ApproveClipsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let approved = state.approval.approve(&actor, &request.clip_ids).await?;
    Ok(Json(ApproveClipsResponse { approved }))
}

#[utoipa::path(
    post,
    path = "/api/v0/clips/{clip_id}/reject",
    tag = "clips",
    params(("clip_id" = i64, Path, description = "Clip ID")),
    responses(
        (status = 204, description = "Clip rejected and deleted"),
        (status = 403, description = "Coach role required", body = ErrorResponse),
        (status = 404, description = "Clip not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, actor),
    fields(team_id = actor.team_id, operation = "reject_clip")
)]
pub async fn reject_clip(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.approval.reject(&actor, clip_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
