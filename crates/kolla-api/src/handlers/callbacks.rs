//! Machine-to-machine endpoints: the first-party processing callback and
//! the transcoding provider's webhook. Neither carries a bearer token.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use kolla_core::{
    models::{CallbackAck, ProcessingCallback},
    AppError,
};
use kolla_services::WebhookOutcome;

use crate::constants::JOB_SECRET_HEADER;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v0/internal/processing-callback",
    tag = "callbacks",
    request_body = ProcessingCallback,
    params(
        ("x-job-secret" = String, Header, description = "Shared processing secret")
    ),
    responses(
        (status = 200, description = "Update applied", body = CallbackAck),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 401, description = "Invalid job secret", body = ErrorResponse),
        (status = 404, description = "Unknown clip", body = ErrorResponse),
        (status = 409, description = "Clip is not processing", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, headers, body),
    fields(bytes = body.len(), operation = "processing_callback")
)]
pub async fn processing_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let secret = headers
        .get(JOB_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    // Unauthenticated callers learn nothing about the body format.
    state.webhooks.verify_job_secret(secret)?;

    let callback: ProcessingCallback = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid request body: {}", e)))?;
    state.webhooks.processing_callback(secret, callback).await?;

    Ok(Json(CallbackAck { ok: true }))
}

/// Providers check the URL with a GET before they start posting.
#[utoipa::path(
    get,
    path = "/api/v0/webhooks/transcoding",
    tag = "callbacks",
    responses((status = 200, description = "Endpoint reachable", body = String))
)]
pub async fn webhook_ping() -> &'static str {
    "OK"
}

#[utoipa::path(
    post,
    path = "/api/v0/webhooks/transcoding",
    tag = "callbacks",
    request_body(content = String, description = "Provider-specific payload"),
    responses(
        (status = 200, description = "Accepted, applied or dropped", body = String),
        (status = 401, description = "Signature check failed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, body), fields(bytes = body.len(), operation = "transcoding_webhook"))]
pub async fn transcoding_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    match state.webhooks.provider_webhook(&headers, &body).await? {
        WebhookOutcome::Applied { clip_id, status } => {
            tracing::info!(clip_id, status = %status, "Transcoding webhook applied");
        }
        WebhookOutcome::InProgress { clip_id } => {
            tracing::debug!(clip_id, "Transcoding webhook: job in progress");
        }
        WebhookOutcome::Dropped(reason) => {
            tracing::info!(reason, "Transcoding webhook dropped");
        }
    }

    Ok((StatusCode::OK, "OK"))
}
