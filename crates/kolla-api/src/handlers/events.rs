use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use kolla_core::models::{CreateEventRequest, Event};
use validator::Validate;

use crate::auth::AuthenticatedActor;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v0/events",
    tag = "events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Coach role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, actor, request),
    fields(team_id = actor.team_id, operation = "create_event")
)]
pub async fn create_event(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateEventRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    let event = state.events.create(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

#[utoipa::path(
    get,
    path = "/api/v0/events",
    tag = "events",
    responses((status = 200, description = "Team events", body = [Event])),
    security(("bearer_auth" = []))
)]
pub async fn list_events(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.events.list(&actor).await?))
}

#[utoipa::path(
    get,
    path = "/api/v0/events/{event_id}",
    tag = "events",
    params(("event_id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event found", body = Event),
        (status = 404, description = "Event not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_event(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.events.get(&actor, event_id).await?))
}

/// Deletes the event, its clips and their stored objects.
#[utoipa::path(
    delete,
    path = "/api/v0/events/{event_id}",
    tag = "events",
    params(("event_id" = i64, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 403, description = "Coach role required", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, actor),
    fields(team_id = actor.team_id, operation = "delete_event")
)]
pub async fn delete_event(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.events.delete(&actor, event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
