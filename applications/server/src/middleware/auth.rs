//! Authentication middleware
use crate::{error::ServerError, state::AppState};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use ensemble_core::{Actor, AuthFailure};

/// The identity a request acts as, re-resolved from the accounts on every
/// request so role and approval changes apply immediately.
/// Can be used as an extractor in handlers
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl CurrentActor {
    pub fn actor(&self) -> &Actor {
        &self.0
    }
}

/// Middleware that extracts and validates JWT from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ServerError::Club(AuthFailure::NotSignedIn.into()))?;

    // Check Bearer prefix
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ServerError::Auth("Expected a bearer token".to_string()))?;

    // Verify token
    let user_id = state.auth_service.verify_access_token(token).map_err(|e| {
        tracing::warn!("Token verification failed: {}", e);
        e
    })?;

    // Deleted or unapproved accounts lose access even with a valid token
    let actor = state.club.actor(&user_id).await?;

    request.extensions_mut().insert(CurrentActor(actor));

    Ok(next.run(request).await)
}

/// Implement FromRequestParts so CurrentActor can be used as an extractor
#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentActor>()
            .cloned()
            .ok_or_else(|| ServerError::Club(AuthFailure::NotSignedIn.into()))
    }
}
