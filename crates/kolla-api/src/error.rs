//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>` and propagate
//! `AppError` with `?`. The status, body and log level all come from
//! [`ErrorMetadata`], so every route renders failures the same way.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kolla_core::{AppError, ErrorMetadata, LogLevel};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::OnceLock;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code, e.g. `LINK_EXPIRED`
    pub code: String,
    /// Whether retrying the same request may succeed
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    fn from_app_error(error: &AppError, with_details: bool) -> Self {
        ErrorResponse {
            error: error.client_message(),
            details: with_details.then(|| error.detailed_message()),
            error_type: with_details.then(|| error.error_type().to_string()),
            code: error.error_code().to_string(),
            recoverable: error.is_recoverable(),
            suggested_action: error.suggested_action().map(String::from),
        }
    }
}

/// Local wrapper so `AppError` can implement `IntoResponse`.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl From<validator::ValidationErrors> for HttpAppError {
    fn from(err: validator::ValidationErrors) -> Self {
        HttpAppError(AppError::from(err))
    }
}

/// JSON body extractor that renders malformed bodies as a 400 `ErrorResponse`.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

impl HttpAppError {
    fn log(&self) {
        let error = &self.0;
        let code = error.error_code();
        match error.log_level() {
            LogLevel::Debug => tracing::debug!(error = %error, code, "Request rejected"),
            LogLevel::Warn => tracing::warn!(error = %error, code, "Request failed upstream"),
            LogLevel::Error => tracing::error!(error = ?error, code, "Request failed"),
        }
    }
}

/// Details are withheld when `ENVIRONMENT` (or `APP_ENV`) says production.
fn details_allowed() -> bool {
    static ALLOWED: OnceLock<bool> = OnceLock::new();
    *ALLOWED.get_or_init(|| {
        let env = std::env::var("ENVIRONMENT")
            .or_else(|_| std::env::var("APP_ENV"))
            .unwrap_or_default()
            .to_lowercase();
        !matches!(env.as_str(), "production" | "prod")
    })
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        self.log();

        let error = &self.0;
        let status =
            StatusCode::from_u16(error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse::from_app_error(error, details_allowed() && !error.is_sensitive());

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_link_renders_as_forbidden() {
        let response =
            HttpAppError(AppError::Expired("Upload link has expired".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn invalid_state_renders_as_conflict() {
        let response =
            HttpAppError(AppError::InvalidState("clip is ready".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn sensitive_errors_carry_no_details() {
        let body = ErrorResponse::from_app_error(
            &AppError::Internal("connection string leaked".to_string()),
            false,
        );
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("details").is_none());
        assert!(json.get("errorType").is_none());
        assert_eq!(json["code"], "INTERNAL_ERROR");
    }

    #[test]
    fn error_response_shape() {
        let body = ErrorResponse::from_app_error(&AppError::not_found("Clip", 7), true);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["error"].is_string());
        assert!(json["recoverable"].is_boolean());
        assert_eq!(json["errorType"], "NotFound");
    }
}
