use std::ops::Deref;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use kolla_core::{Actor, AppError};

use crate::auth::jwt::JwtService;
use crate::error::HttpAppError;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtService,
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".to_string()))
}

/// Verify the bearer token and attach the caller as an [`Actor`] extension.
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = match bearer_token(&request).and_then(|token| auth_state.jwt.verify(token)) {
        Ok(claims) => claims,
        Err(e) => return HttpAppError(e).into_response(),
    };

    let actor = Actor::from(claims);
    tracing::debug!(team_id = actor.team_id, user_id = %actor.user_id, role = %actor.role, "Authenticated");
    request.extensions_mut().insert(actor);
    next.run(request).await
}

/// The authenticated caller, as attached by [`auth_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedActor(pub Actor);

impl Deref for AuthenticatedActor {
    type Target = Actor;

    fn deref(&self) -> &Actor {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthenticatedActor
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .copied()
            .map(AuthenticatedActor)
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Missing team context".to_string())))
    }
}
