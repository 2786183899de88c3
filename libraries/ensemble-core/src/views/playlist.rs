//! Playlist list and search

use super::{contains_folded, SUGGESTION_LIMIT};
use crate::collate;
use crate::types::Song;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Song field the search box filters on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    #[default]
    Title,
    Artist,
    Version,
}

impl SearchField {
    pub fn value_of(self, song: &Song) -> &str {
        match self {
            SearchField::Title => &song.title,
            SearchField::Artist => &song.artist,
            SearchField::Version => song.version_label(),
        }
    }
}

/// Search box state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistQuery {
    #[serde(default)]
    pub field: SearchField,
    #[serde(default, rename = "q")]
    pub text: String,
}

/// One numbered playlist row
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistRow<'a> {
    /// 1-based position in the filtered list
    pub number: usize,
    #[serde(flatten)]
    pub song: &'a Song,
}

/// Songs sorted by title, filtered by the query, numbered from 1.
pub fn render_playlist<'a>(songs: &'a [Song], query: &PlaylistQuery) -> Vec<PlaylistRow<'a>> {
    let needle = query.text.trim().to_lowercase();
    let mut sorted: Vec<&Song> = songs.iter().collect();
    sorted.sort_by(|a, b| collate::compare(&a.title, &b.title));

    sorted
        .into_iter()
        .filter(|song| needle.is_empty() || contains_folded(query.field.value_of(song), &needle))
        .enumerate()
        .map(|(idx, song)| PlaylistRow {
            number: idx + 1,
            song,
        })
        .collect()
}

/// Distinct values of `field` containing `text`, sorted, at most eight.
pub fn suggestions(songs: &[Song], field: SearchField, text: &str) -> Vec<String> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    let mut values: Vec<String> = songs
        .iter()
        .map(|song| field.value_of(song))
        .filter(|value| !value.is_empty() && contains_folded(value, &needle))
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect();
    values.sort_by(|a, b| collate::compare(a, b));
    values.truncate(SUGGESTION_LIMIT);
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{default_parts, SongId};

    fn song(title: &str, artist: &str) -> Song {
        Song {
            id: SongId::generate(),
            title: title.into(),
            artist: artist.into(),
            version: None,
            parts: default_parts(),
        }
    }

    #[test]
    fn rows_sort_numerically_and_number_from_one() {
        let songs = vec![song("10차 연습", "a"), song("2차 연습", "a"), song("1차 연습", "a")];
        let rows = render_playlist(&songs, &PlaylistQuery::default());
        let titles: Vec<_> = rows.iter().map(|r| r.song.title.as_str()).collect();
        assert_eq!(titles, vec!["1차 연습", "2차 연습", "10차 연습"]);
        assert_eq!(rows[2].number, 3);
    }

    #[test]
    fn filter_uses_selected_field() {
        let songs = vec![song("Yellow", "Coldplay"), song("Creep", "Radiohead")];
        let query = PlaylistQuery {
            field: SearchField::Artist,
            text: "RADIO".into(),
        };
        let rows = render_playlist(&songs, &query);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].song.title, "Creep");
        assert_eq!(rows[0].number, 1);
    }

    #[test]
    fn suggestions_are_distinct_and_capped() {
        let mut songs: Vec<Song> = (0..12).map(|i| song(&format!("Song {}", i), "Band")).collect();
        songs.push(song("Other", "Band"));
        assert_eq!(suggestions(&songs, SearchField::Artist, "ban"), vec!["Band"]);
        let titles = suggestions(&songs, SearchField::Title, "song");
        assert_eq!(titles.len(), SUGGESTION_LIMIT);
        assert_eq!(titles[0], "Song 0");
        assert_eq!(titles[2], "Song 2");
        assert!(suggestions(&songs, SearchField::Title, " ").is_empty());
    }
}
