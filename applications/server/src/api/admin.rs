//! Admin API routes
//!
//! Role checks happen in the club; a member calling these gets 403.
use crate::{
    api::detached,
    error::{Result, ServerError},
    middleware::CurrentActor,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use ensemble_club::{NewUser, UserEdit};
use ensemble_core::views::admin::{
    render_logs, render_signups, render_users, LogRow, SignupRow, UserRow,
};
use ensemble_core::UserId;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

fn user_row(user: &ensemble_core::User) -> Result<UserRow> {
    render_users(std::slice::from_ref(user))
        .pop()
        .ok_or_else(|| ServerError::Internal("account row missing".to_string()))
}

/// GET /api/admin/signups
/// Registrations waiting for approval, earliest first
pub async fn list_signups(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<SignupRow>>> {
    let signups = state.club.pending_signups(&actor).await?;
    Ok(Json(render_signups(&signups)))
}

/// POST /api/admin/signups/:id/approve
pub async fn approve_signup(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<UserRow>> {
    let club = state.club.clone();
    let id = UserId::new(id);
    let user = detached(async move { club.approve_signup(&actor, &id).await }).await?;
    Ok(Json(user_row(&user)?))
}

/// POST /api/admin/signups/:id/reject
pub async fn reject_signup(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let club = state.club.clone();
    let id = UserId::new(id);
    detached(async move { club.reject_signup(&actor, &id).await }).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<UserRow>>> {
    let users = state.club.users(&actor).await?;
    Ok(Json(render_users(&users)))
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(req): Json<NewUser>,
) -> Result<(StatusCode, Json<UserRow>)> {
    let club = state.club.clone();
    let user = detached(async move { club.create_user(&actor, req).await }).await?;
    Ok((StatusCode::CREATED, Json(user_row(&user)?)))
}

/// PUT /api/admin/users/:id
/// An empty password leaves the credential unchanged
pub async fn update_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(req): Json<UserEdit>,
) -> Result<Json<UserRow>> {
    let club = state.club.clone();
    let id = UserId::new(id);
    let user = detached(async move { club.update_user(&actor, &id, req).await }).await?;
    Ok(Json(user_row(&user)?))
}

/// DELETE /api/admin/users/:id
/// A deleted member's tokens stop working on their next request
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let club = state.club.clone();
    let id = UserId::new(id);
    detached(async move { club.delete_user(&actor, &id).await }).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/users/:id/password
pub async fn reset_password(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<StatusCode> {
    let club = state.club.clone();
    let id = UserId::new(id);
    detached(async move { club.reset_password(&actor, &id, &req.password).await }).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/logs
/// Newest 300 entries with readable descriptions
pub async fn list_logs(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<LogRow>>> {
    let logs = state.club.logs(&actor).await?;
    Ok(Json(render_logs(&logs)))
}

/// DELETE /api/admin/logs
pub async fn clear_logs(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<StatusCode> {
    let club = state.club.clone();
    detached(async move { club.clear_logs(&actor).await }).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/logs/export
/// Download of every entry as a JSON array
pub async fn export_logs(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<impl IntoResponse> {
    let body = state.club.export_logs(&actor).await?;
    let filename = format!(
        "attachment; filename=\"ensemble-logs-{}.json\"",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        body,
    ))
}
