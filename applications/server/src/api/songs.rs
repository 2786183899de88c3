//! Playlist API routes
use crate::{api::detached, error::Result, middleware::CurrentActor, state::AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use ensemble_core::views::playlist::{render_playlist, suggestions, PlaylistQuery};
use ensemble_core::{ClubError, Song, SongDraft, SongId};
use futures_util::stream::{self, Stream};
use serde_json::Value;
use std::convert::Infallible;

/// GET /api/songs?field=title&q=...
/// Numbered rows sorted by title, filtered by the search box
pub async fn list_songs(
    State(state): State<AppState>,
    _auth: CurrentActor,
    Query(query): Query<PlaylistQuery>,
) -> Result<Json<Value>> {
    let songs = state.club.songs().await;
    let rows = render_playlist(&songs, &query);
    Ok(Json(serde_json::to_value(rows).map_err(ClubError::from)?))
}

/// GET /api/songs/suggest?field=artist&q=...
pub async fn suggest(
    State(state): State<AppState>,
    _auth: CurrentActor,
    Query(query): Query<PlaylistQuery>,
) -> Json<Vec<String>> {
    let songs = state.club.songs().await;
    Json(suggestions(&songs, query.field, &query.text))
}

/// GET /api/songs/:id
pub async fn get_song(
    State(state): State<AppState>,
    _auth: CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<Song>> {
    Ok(Json(state.club.song(&SongId::new(id)).await?))
}

/// POST /api/songs
pub async fn create_song(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(draft): Json<SongDraft>,
) -> Result<(StatusCode, Json<Song>)> {
    let club = state.club.clone();
    let song = detached(async move { club.create_song(&actor, draft).await }).await?;
    Ok((StatusCode::CREATED, Json(song)))
}

/// PUT /api/songs/:id
pub async fn update_song(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(draft): Json<SongDraft>,
) -> Result<Json<Song>> {
    let club = state.club.clone();
    let id = SongId::new(id);
    let song = detached(async move { club.update_song(&actor, &id, draft).await }).await?;
    Ok(Json(song))
}

/// DELETE /api/songs/:id
pub async fn delete_song(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let club = state.club.clone();
    let id = SongId::new(id);
    detached(async move { club.delete_song(&actor, &id).await }).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/songs/live
/// Server-sent playlist snapshots; the subscription is released when the
/// client goes away and the stream is dropped.
pub async fn live(
    State(state): State<AppState>,
    _auth: CurrentActor,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let view = state.club.watch_songs().await?;

    let events = stream::unfold(view, |mut view| async move {
        let songs = view.next().await?;
        let event = Event::default()
            .event("songs")
            .json_data(&songs)
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to encode playlist snapshot: {}", e);
                Event::default().event("error")
            });
        Some((Ok(event), view))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
