use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use kolla_core::models::{AddPlaylistItemRequest, CreatePlaylistRequest, Playlist, ReorderRequest};

use crate::auth::AuthenticatedActor;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v0/playlists",
    tag = "playlists",
    request_body = CreatePlaylistRequest,
    responses(
        (status = 201, description = "Playlist created", body = Playlist),
        (status = 400, description = "Invalid name", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_playlist(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreatePlaylistRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let playlist = state.playlists.create(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

#[utoipa::path(
    get,
    path = "/api/v0/playlists",
    tag = "playlists",
    responses((status = 200, description = "Team playlists, most recently changed first", body = [Playlist])),
    security(("bearer_auth" = []))
)]
pub async fn list_playlists(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.playlists.list(&actor).await?))
}

#[utoipa::path(
    get,
    path = "/api/v0/playlists/{playlist_id}",
    tag = "playlists",
    params(("playlist_id" = i64, Path, description = "Playlist ID")),
    responses(
        (status = 200, description = "Playlist with items in position order"),
        (status = 404, description = "Playlist not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_playlist(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.playlists.get(&actor, playlist_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v0/playlists/{playlist_id}",
    tag = "playlists",
    params(("playlist_id" = i64, Path, description = "Playlist ID")),
    request_body = CreatePlaylistRequest,
    responses(
        (status = 200, description = "Playlist renamed", body = Playlist),
        (status = 404, description = "Playlist not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn rename_playlist(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<CreatePlaylistRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(
        state
            .playlists
            .rename(&actor, playlist_id, &request.name)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v0/playlists/{playlist_id}",
    tag = "playlists",
    params(("playlist_id" = i64, Path, description = "Playlist ID")),
    responses(
        (status = 204, description = "Playlist deleted"),
        (status = 404, description = "Playlist not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_playlist(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.playlists.delete(&actor, playlist_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v0/playlists/{playlist_id}/items",
    tag = "playlists",
    params(("playlist_id" = i64, Path, description = "Playlist ID")),
    request_body = AddPlaylistItemRequest,
    responses(
        (status = 201, description = "Item appended"),
        (status = 400, description = "Exactly one of clipId and segmentId is required", body = ErrorResponse),
        (status = 404, description = "Playlist, clip or segment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, actor, request),
    fields(team_id = actor.team_id, operation = "add_playlist_item")
)]
pub async fn add_playlist_item(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<AddPlaylistItemRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let item = state.playlists.add_item(&actor, playlist_id, request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    delete,
    path = "/api/v0/playlists/{playlist_id}/items/{item_id}",
    tag = "playlists",
    params(
        ("playlist_id" = i64, Path, description = "Playlist ID"),
        ("item_id" = i64, Path, description = "Playlist item ID")
    ),
    responses(
        (status = 204, description = "Item removed, positions compacted"),
        (status = 404, description = "Playlist or item not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_playlist_item(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path((playlist_id, item_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .playlists
        .remove_item(&actor, playlist_id, item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/v0/playlists/{playlist_id}/items/order",
    tag = "playlists",
    params(("playlist_id" = i64, Path, description = "Playlist ID")),
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Playlist with items in the new order"),
        (status = 400, description = "Ids are not a permutation of the items", body = ErrorResponse),
        (status = 403, description = "Coach role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn reorder_playlist_items(
    actor: AuthenticatedActor,
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<ReorderRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(
        state
            .playlists
            .reorder(&actor, playlist_id, &request.ids)
            .await?,
    ))
}
