//! Playlist operations

use crate::club::{Changes, Club};
use ensemble_core::{Action, Actor, ClubError, LogAction, Result, Song, SongDraft, SongId};
use serde_json::json;
use tracing::debug;

impl Club {
    /// Current playlist snapshot
    pub async fn songs(&self) -> Vec<Song> {
        self.state.lock().await.songs.clone()
    }

    pub async fn song(&self, id: &SongId) -> Result<Song> {
        self.state
            .lock()
            .await
            .songs
            .iter()
            .find(|s| &s.id == id)
            .cloned()
            .ok_or_else(|| ClubError::not_found("Song", id.as_str()))
    }

    pub async fn create_song(&self, actor: &Actor, draft: SongDraft) -> Result<Song> {
        self.policy.authorize(Some(actor), Action::EditSongs)?;
        let song = draft.validate()?.into_song(SongId::generate());

        let mut state = self.lock().await;
        let mut songs = self.load_songs().await?;
        songs.push(song.clone());

        let meta = json!({ "title": song.title, "artist": song.artist });
        let changes = Changes::default().songs(songs);
        self.commit(&mut state, changes, Some(actor), LogAction::SongAdded, meta).await?;
        debug!(id = %song.id, "Song added");
        Ok(song)
    }

    pub async fn update_song(&self, actor: &Actor, id: &SongId, draft: SongDraft) -> Result<Song> {
        self.policy.authorize(Some(actor), Action::EditSongs)?;
        let valid = draft.validate()?;

        let mut state = self.lock().await;
        let mut songs = self.load_songs().await?;
        let slot = songs
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| ClubError::not_found("Song", id.as_str()))?;
        *slot = valid.into_song(id.clone());
        let song = slot.clone();

        let meta = json!({ "title": song.title, "artist": song.artist });
        let changes = Changes::default().songs(songs);
        self.commit(&mut state, changes, Some(actor), LogAction::SongEdited, meta).await?;
        Ok(song)
    }

    pub async fn delete_song(&self, actor: &Actor, id: &SongId) -> Result<()> {
        self.policy.authorize(Some(actor), Action::EditSongs)?;

        let mut state = self.lock().await;
        let mut songs = self.load_songs().await?;
        let idx = songs
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| ClubError::not_found("Song", id.as_str()))?;
        let removed = songs.remove(idx);

        let meta = json!({ "title": removed.title, "artist": removed.artist });
        let changes = Changes::default().songs(songs);
        self.commit(&mut state, changes, Some(actor), LogAction::SongDeleted, meta).await
    }
}
