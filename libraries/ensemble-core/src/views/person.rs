//! Lookup of songs by player name
//!
//! Player fields may list several names separated by `,` `/` or `&`. A part
//! matches when any one of its names contains the search text, and every
//! matching part of a song yields its own row.

use super::{contains_folded, SUGGESTION_LIMIT};
use crate::collate;
use crate::types::{player_tokens, Song};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sortable result column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonColumn {
    #[default]
    Title,
    Artist,
    Version,
    Part,
    Ref,
    Misc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Current sort of the result table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSort {
    #[serde(default)]
    pub key: PersonColumn,
    #[serde(default)]
    pub dir: SortDirection,
}

impl PersonSort {
    /// Header click: flip direction on the active column, otherwise switch
    /// to `column` ascending.
    pub fn toggle(&mut self, column: PersonColumn) {
        if self.key == column {
            self.dir = match self.dir {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
        } else {
            self.key = column;
            self.dir = SortDirection::Asc;
        }
    }
}

/// One matching part
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonRow<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub version: &'a str,
    pub part: &'a str,
    #[serde(rename = "ref")]
    pub reference: &'a str,
    pub misc: &'a str,
}

impl PersonRow<'_> {
    fn column(&self, column: PersonColumn) -> &str {
        match column {
            PersonColumn::Title => self.title,
            PersonColumn::Artist => self.artist,
            PersonColumn::Version => self.version,
            PersonColumn::Part => self.part,
            PersonColumn::Ref => self.reference,
            PersonColumn::Misc => self.misc,
        }
    }
}

/// Every part whose player list has a name containing `name`.
pub fn find_by_person<'a>(songs: &'a [Song], name: &str, sort: PersonSort) -> Vec<PersonRow<'a>> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut rows = Vec::new();
    for song in songs {
        for part in &song.parts {
            if part.players().any(|player| contains_folded(player, &needle)) {
                rows.push(PersonRow {
                    title: &song.title,
                    artist: &song.artist,
                    version: song.version_label(),
                    part: &part.label,
                    reference: &part.reference,
                    misc: &part.misc,
                });
            }
        }
    }

    rows.sort_by(|a, b| {
        let ordering = collate::compare(a.column(sort.key), b.column(sort.key));
        match sort.dir {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    rows
}

/// Every distinct player name across the playlist, sorted
pub fn player_directory(songs: &[Song]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names: Vec<String> = songs
        .iter()
        .flat_map(|s| s.parts.iter())
        .flat_map(|p| player_tokens(&p.player))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect();
    names.sort_by(|a, b| collate::compare(a, b));
    names
}

/// Player names containing `text` (all names when empty), at most eight
pub fn player_suggestions(songs: &[Song], text: &str) -> Vec<String> {
    let needle = text.trim().to_lowercase();
    player_directory(songs)
        .into_iter()
        .filter(|n| needle.is_empty() || contains_folded(n, &needle))
        .take(SUGGESTION_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{default_parts, SongId};

    fn song(title: &str, assignments: &[(&str, &str)]) -> Song {
        let mut parts = default_parts();
        for (key, player) in assignments {
            if let Some(p) = parts.iter_mut().find(|p| p.key == *key) {
                p.player = (*player).to_string();
            }
        }
        Song {
            id: SongId::generate(),
            title: title.into(),
            artist: "Band".into(),
            version: None,
            parts,
        }
    }

    #[test]
    fn matches_per_token() {
        let songs = vec![
            song("A", &[("Vocal1", "민수, 철수")]),
            song("B", &[("Drums", "영희")]),
        ];
        let rows = find_by_person(&songs, "철수", PersonSort::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "A");
        assert_eq!(rows[0].part, "보컬 1");
    }

    #[test]
    fn token_substring_still_matches() {
        let songs = vec![song("A", &[("Bass", "민수철")])];
        assert_eq!(find_by_person(&songs, "민수", PersonSort::default()).len(), 1);
    }

    #[test]
    fn each_matching_part_is_a_row_and_sort_toggles() {
        let songs = vec![
            song("2nd Song", &[("Bass", "지수")]),
            song("10th Song", &[("Vocal1", "지수 & 민수"), ("Drums", "지수")]),
        ];
        let mut sort = PersonSort::default();
        let rows = find_by_person(&songs, "지수", sort);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].title, "2nd Song");

        sort.toggle(PersonColumn::Title);
        assert_eq!(sort.dir, SortDirection::Desc);
        let rows = find_by_person(&songs, "지수", sort);
        assert_eq!(rows[0].title, "10th Song");

        sort.toggle(PersonColumn::Part);
        assert_eq!(sort, PersonSort { key: PersonColumn::Part, dir: SortDirection::Asc });
    }

    #[test]
    fn directory_is_distinct_and_sorted() {
        let songs = vec![
            song("A", &[("Vocal1", "철수/민수"), ("Bass", "민수")]),
            song("B", &[("Drums", "Alex")]),
        ];
        assert_eq!(player_directory(&songs), vec!["민수", "철수", "Alex"]);
        assert_eq!(player_suggestions(&songs, "민"), vec!["민수"]);
        assert_eq!(player_suggestions(&songs, "").len(), 3);
    }

    #[test]
    fn directory_drops_repeats_across_many_songs() {
        let songs: Vec<Song> = (0..200)
            .map(|i| song(&format!("Song {}", i), &[("Vocal1", "민수, Zoe"), ("Bass", "éric")]))
            .collect();
        assert_eq!(player_directory(&songs), vec!["민수", "éric", "Zoe"]);
    }
}
