//! By-person lookup
use crate::{error::Result, middleware::CurrentActor, state::AppState};
use axum::{
    extract::{Query, State},
    Json,
};
use ensemble_core::views::person::{
    find_by_person, player_suggestions, PersonColumn, PersonSort, SortDirection,
};
use ensemble_core::ClubError;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct PersonQuery {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: PersonColumn,
    #[serde(default)]
    pub dir: SortDirection,
}

#[derive(Debug, Default, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/people?name=철수&key=title&dir=asc
/// One row per part the person plays
pub async fn find(
    State(state): State<AppState>,
    _auth: CurrentActor,
    Query(query): Query<PersonQuery>,
) -> Result<Json<Value>> {
    let songs = state.club.songs().await;
    let sort = PersonSort {
        key: query.key,
        dir: query.dir,
    };
    let rows = find_by_person(&songs, &query.name, sort);
    Ok(Json(serde_json::to_value(rows).map_err(ClubError::from)?))
}

/// GET /api/people/suggest?q=...
pub async fn suggest(
    State(state): State<AppState>,
    _auth: CurrentActor,
    Query(query): Query<SuggestQuery>,
) -> Json<Vec<String>> {
    let songs = state.club.songs().await;
    Json(player_suggestions(&songs, &query.q))
}
