use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use kolla_core::models::{CreateSegmentRequest, ReorderRequest, Segment, UpdateSegmentRequest};

use crate::auth::AuthenticatedActor;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v0/clips/{clip_id}/segments",
    tag = "segments",
    params(("clip_id" = i64, Path, description = "Clip ID")),
    request_body = CreateSegmentRequest,
    responses(
        (status = 201, description = "Segment created", body = Segment),
        (status = 400, description = "Invalid range or tags", body = ErrorResponse),
        (status = 404, description = "Clip not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, actor, request),
    fields(team_id = actor.team_id, operation = "create_segment")
)]
pub async fn create_segment(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<CreateSegmentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let segment = state.segments.create(&actor, clip_id, request).await?;
    Ok((StatusCode::CREATED, Json(segment)))
}

#[utoipa::path(
    get,
    path = "/api/v0/clips/{clip_id}/segments",
    tag = "segments",
    params(("clip_id" = i64, Path, description = "Clip ID")),
    responses(
        (status = 200, description = "Segments in index order", body = [Segment]),
        (status = 404, description = "Clip not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_segments(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.segments.list(&actor, clip_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v0/clips/{clip_id}/segments/order",
    tag = "segments",
    params(("clip_id" = i64, Path, description = "Clip ID")),
    request_body = ReorderRequest,
    responses(
        (status = 204, description = "Segments re-indexed"),
        (status = 400, description = "Ids are not a permutation", body = ErrorResponse),
        (status = 403, description = "Coach role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn reorder_segments(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<ReorderRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.segments.reorder(&actor, clip_id, &request.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v0/segments/{segment_id}",
    tag = "segments",
    params(("segment_id" = i64, Path, description = "Segment ID")),
    responses(
        (status = 200, description = "Segment found", body = Segment),
        (status = 404, description = "Segment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_segment(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(segment_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.segments.get(&actor, segment_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v0/segments/{segment_id}",
    tag = "segments",
    params(("segment_id" = i64, Path, description = "Segment ID")),
    request_body = UpdateSegmentRequest,
    responses(
        (status = 200, description = "Segment updated", body = Segment),
        (status = 400, description = "Invalid range or tags", body = ErrorResponse),
        (status = 404, description = "Segment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_segment(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(segment_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateSegmentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.segments.update(&actor, segment_id, request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v0/segments/{segment_id}",
    tag = "segments",
    params(("segment_id" = i64, Path, description = "Segment ID")),
    responses(
        (status = 204, description = "Segment deleted; playlists referencing it are compacted"),
        (status = 404, description = "Segment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_segment(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(segment_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.segments.delete(&actor, segment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
