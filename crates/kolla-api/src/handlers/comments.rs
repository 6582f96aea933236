use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use kolla_core::models::{Comment, CreateCommentRequest};

use crate::auth::AuthenticatedActor;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v0/clips/{clip_id}/comments",
    tag = "comments",
    params(("clip_id" = i64, Path, description = "Clip ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 400, description = "Empty body, or segment/parent on another clip", body = ErrorResponse),
        (status = 404, description = "Clip not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, actor, request),
    fields(team_id = actor.team_id, operation = "add_comment")
)]
pub async fn add_comment(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let comment = state.comments.add(&actor, clip_id, request).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Top-level comments in creation order, each with its replies nested.
#[utoipa::path(
    get,
    path = "/api/v0/clips/{clip_id}/comments",
    tag = "comments",
    params(("clip_id" = i64, Path, description = "Clip ID")),
    responses(
        (status = 200, description = "Threaded comments"),
        (status = 404, description = "Clip not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_comments(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.comments.list(&actor, clip_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v0/comments/{comment_id}",
    tag = "comments",
    params(("comment_id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment and its replies deleted"),
        (status = 403, description = "Only the author or a coach", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_comment(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.comments.delete(&actor, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
