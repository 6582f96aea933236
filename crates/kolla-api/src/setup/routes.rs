//! Route configuration and setup

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
    Json, Router,
};
use kolla_core::Config;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api_doc::ApiDoc;
use crate::auth::auth_middleware;
use crate::constants::{API_PREFIX, MAX_CONCURRENT_REQUESTS, MAX_REQUEST_BODY_BYTES};
use crate::handlers;
use crate::middleware::{request_id_middleware, security_headers_middleware, SecurityHeadersConfig};
use crate::state::AppState;

fn api(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    let cors = setup_cors(config);
    let security_headers_config = Arc::new(SecurityHeadersConfig::new(config.is_production()));

    let protected_routes = protected_routes().layer(axum::middleware::from_fn_with_state(
        state.auth.clone(),
        auth_middleware,
    ));

    public_routes()
        .merge(protected_routes)
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn_with_state(
            security_headers_config,
            security_headers_middleware,
        ))
        .with_state(state)
}

fn setup_cors(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(Any)
}

/// Health, docs, machine callbacks and token-scoped public routes.
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route(
            &api("/internal/processing-callback"),
            post(handlers::callbacks::processing_callback),
        )
        .route(
            &api("/webhooks/transcoding"),
            get(handlers::callbacks::webhook_ping).post(handlers::callbacks::transcoding_webhook),
        )
        .route(
            &api("/public/share/{token}"),
            get(handlers::public::resolve_share),
        )
        .route(
            &api("/public/playlists/{token}"),
            get(handlers::public::resolve_playlist_share),
        )
        .route(
            &api("/public/upload-links/{token}"),
            get(handlers::public::resolve_upload_link),
        )
        .route(
            &api("/public/upload-links/{token}/presign"),
            post(handlers::public::presign_with_link),
        )
        .route(
            &api("/public/upload-links/{token}/reserve-indices"),
            post(handlers::public::reserve_with_link),
        )
        .route(
            &api("/public/upload-links/{token}/clips/{clip_id}/confirm"),
            post(handlers::public::confirm_with_link),
        )
        .route(
            &api("/public/upload-links/{token}/clips/{clip_id}/process"),
            post(handlers::public::process_with_link),
        )
}

/// Routes that need a bearer token. The auth layer is applied by the caller.
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Events
        .route(
            &api("/events"),
            post(handlers::events::create_event).get(handlers::events::list_events),
        )
        .route(
            &api("/events/{event_id}"),
            get(handlers::events::get_event).delete(handlers::events::delete_event),
        )
        .route(
            &api("/events/{event_id}/clips"),
            get(handlers::clips::list_event_clips),
        )
        .route(
            &api("/events/{event_id}/clips/pending"),
            get(handlers::clips::list_pending_clips),
        )
        .route(
            &api("/events/{event_id}/clips/order"),
            put(handlers::clips::reorder_clips),
        )
        .route(
            &api("/events/{event_id}/clips/reserve-indices"),
            post(handlers::clips::reserve_indices),
        )
        // Uploads
        .route(&api("/uploads/presign"), post(handlers::uploads::presign_upload))
        .route(
            &api("/clips/{clip_id}/confirm"),
            post(handlers::uploads::confirm_upload),
        )
        .route(
            &api("/clips/{clip_id}/process"),
            post(handlers::uploads::enqueue_processing),
        )
        // Clips and approval
        .route(&api("/clips/approve"), post(handlers::clips::approve_clips))
        .route(
            &api("/clips/{clip_id}"),
            get(handlers::clips::get_clip)
                .patch(handlers::clips::update_clip)
                .delete(handlers::clips::delete_clip),
        )
        .route(
            &api("/clips/{clip_id}/reject"),
            post(handlers::clips::reject_clip),
        )
        // Segments
        .route(
            &api("/clips/{clip_id}/segments"),
            post(handlers::segments::create_segment).get(handlers::segments::list_segments),
        )
        .route(
            &api("/clips/{clip_id}/segments/order"),
            put(handlers::segments::reorder_segments),
        )
        .route(
            &api("/segments/{segment_id}"),
            get(handlers::segments::get_segment)
                .patch(handlers::segments::update_segment)
                .delete(handlers::segments::delete_segment),
        )
        // Comments
        .route(
            &api("/clips/{clip_id}/comments"),
            post(handlers::comments::add_comment).get(handlers::comments::list_comments),
        )
        .route(
            &api("/comments/{comment_id}"),
            delete(handlers::comments::delete_comment),
        )
        // Playlists
        .route(
            &api("/playlists"),
            post(handlers::playlists::create_playlist).get(handlers::playlists::list_playlists),
        )
        .route(
            &api("/playlists/{playlist_id}"),
            get(handlers::playlists::get_playlist)
                .patch(handlers::playlists::rename_playlist)
                .delete(handlers::playlists::delete_playlist),
        )
        .route(
            &api("/playlists/{playlist_id}/items"),
            post(handlers::playlists::add_playlist_item),
        )
        .route(
            &api("/playlists/{playlist_id}/items/order"),
            put(handlers::playlists::reorder_playlist_items),
        )
        .route(
            &api("/playlists/{playlist_id}/items/{item_id}"),
            delete(handlers::playlists::remove_playlist_item),
        )
        // Upload links
        .route(
            &api("/events/{event_id}/upload-links"),
            post(handlers::links::create_upload_link).get(handlers::links::list_upload_links),
        )
        .route(
            &api("/upload-links/{link_id}"),
            delete(handlers::links::revoke_upload_link),
        )
        // Share links
        .route(
            &api("/events/{event_id}/share-links"),
            post(handlers::links::create_event_share).get(handlers::links::list_event_shares),
        )
        .route(
            &api("/events/{event_id}/share-links/{link_id}"),
            delete(handlers::links::revoke_event_share),
        )
        .route(
            &api("/playlists/{playlist_id}/share-links"),
            post(handlers::links::create_playlist_share)
                .get(handlers::links::list_playlist_shares),
        )
        .route(
            &api("/playlists/{playlist_id}/share-links/{link_id}"),
            delete(handlers::links::revoke_playlist_share),
        )
}
