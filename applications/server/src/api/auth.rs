//! Authentication API routes
use crate::{api::detached, error::Result, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use ensemble_club::{Registration, RegistrationOutcome};
use ensemble_core::{Actor, Tab};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Display name (local backend) or email (cloud backend)
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub actor: Actor,
    pub tabs: Vec<Tab>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
}

/// POST /api/auth/login
pub async fn login(
    State(app_state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let actor = app_state.club.authenticate(&req.login, &req.password).await?;

    // Create tokens
    let access_token = app_state.auth_service.create_access_token(&actor.id)?;
    let refresh_token = app_state.auth_service.create_refresh_token(&actor.id)?;
    let tabs = app_state.club.policy().visible_tabs(Some(&actor));

    tracing::info!(name = %actor.name, "Signed in");
    Ok(Json(LoginResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        actor,
        tabs,
    }))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(app_state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>> {
    // Verify refresh token
    let user_id = app_state
        .auth_service
        .verify_refresh_token(&req.refresh_token)?;

    // Approval is re-checked before a new token is issued
    app_state.club.actor(&user_id).await?;

    // Create new access token
    let access_token = app_state.auth_service.create_access_token(&user_id)?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer".to_string(),
    }))
}

/// POST /api/auth/signup
pub async fn signup(
    State(app_state): State<AppState>,
    Json(req): Json<Registration>,
) -> Result<(StatusCode, Json<RegistrationOutcome>)> {
    let club = app_state.club.clone();
    let outcome = detached(async move { club.register(req).await }).await?;
    let status = match outcome {
        RegistrationOutcome::Pending { .. } => StatusCode::ACCEPTED,
        RegistrationOutcome::Approved { .. } => StatusCode::CREATED,
    };
    Ok((status, Json(outcome)))
}
