//! Signed-in member's own account
use crate::{api::detached, error::Result, middleware::CurrentActor, state::AppState};
use axum::{extract::State, Json};
use ensemble_club::ProfileEdit;
use ensemble_core::{Actor, MemberPart, Role, Tab, User, UserId};
use serde::Serialize;

/// Account as shown to its owner; never carries the credential hash
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub dept: String,
    #[serde(flatten)]
    pub part: MemberPart,
    pub role: Role,
    pub tabs: Vec<Tab>,
}

fn profile(state: &AppState, user: User) -> Profile {
    let tabs = state
        .club
        .policy()
        .visible_tabs(Some(&Actor::from(&user)));
    Profile {
        id: user.id,
        name: user.name,
        email: user.email,
        dept: user.dept,
        part: user.part,
        role: user.role,
        tabs,
    }
}

/// GET /api/me
pub async fn get_me(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Profile>> {
    let user = state.club.user(&actor.id).await?;
    Ok(Json(profile(&state, user)))
}

/// PUT /api/me
/// Rename, change department/part, or change password
pub async fn update_me(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(req): Json<ProfileEdit>,
) -> Result<Json<Profile>> {
    let club = state.club.clone();
    let user = detached(async move { club.update_profile(&actor, req).await }).await?;
    Ok(Json(profile(&state, user)))
}
