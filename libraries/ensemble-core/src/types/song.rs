//! Song and part-assignment types

use super::ids::SongId;
use crate::error::{ClubError, Result};
use crate::slug::{slugify, unique_key};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One of the ten parts every song carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultPart {
    pub key: &'static str,
    pub label: &'static str,
}

/// Builtin parts in display order
pub const DEFAULT_PARTS: [DefaultPart; 10] = [
    DefaultPart { key: "1stKeys", label: "1st 건반" },
    DefaultPart { key: "2ndKeys", label: "2nd 건반" },
    DefaultPart { key: "1stElec", label: "1st 일렉" },
    DefaultPart { key: "2ndElec", label: "2nd 일렉" },
    DefaultPart { key: "Acoustic", label: "어쿠스틱 기타" },
    DefaultPart { key: "Bass", label: "베이스 기타" },
    DefaultPart { key: "Drums", label: "드럼" },
    DefaultPart { key: "Vocal1", label: "보컬 1" },
    DefaultPart { key: "Vocal2", label: "보컬 2" },
    DefaultPart { key: "Vocal3", label: "보컬 3" },
];

/// Whether `key` names one of the builtin parts
pub fn is_builtin_key(key: &str) -> bool {
    DEFAULT_PARTS.iter().any(|d| d.key == key)
}

/// Split a player field into individual names.
///
/// `"민수, 철수 & 영희"` yields `["민수", "철수", "영희"]`.
pub fn player_tokens(field: &str) -> impl Iterator<Item = &str> {
    field
        .split([',', '/', '&'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Who plays a part on a song, plus reference material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartAssignment {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub player: String,
    /// Reference/example link
    #[serde(rename = "ref", default)]
    pub reference: String,
    /// Secondary (shared/misc) link
    #[serde(default)]
    pub misc: String,
    #[serde(default)]
    pub builtin: bool,
}

impl PartAssignment {
    /// Empty assignment for a builtin part
    pub fn from_default(part: &DefaultPart) -> Self {
        Self {
            key: part.key.to_string(),
            label: part.label.to_string(),
            player: String::new(),
            reference: String::new(),
            misc: String::new(),
            builtin: true,
        }
    }

    /// Empty custom assignment
    pub fn custom(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            player: String::new(),
            reference: String::new(),
            misc: String::new(),
            builtin: false,
        }
    }

    /// Individual player names listed on this part
    pub fn players(&self) -> impl Iterator<Item = &str> {
        player_tokens(&self.player)
    }
}

/// The ten builtin parts, unassigned
pub fn default_parts() -> Vec<PartAssignment> {
    DEFAULT_PARTS.iter().map(PartAssignment::from_default).collect()
}

/// Song on the club playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub parts: Vec<PartAssignment>,
}

impl Song {
    /// Look up a part by key
    pub fn part(&self, key: &str) -> Option<&PartAssignment> {
        self.parts.iter().find(|p| p.key == key)
    }

    /// Version as shown in views (empty when unset)
    pub fn version_label(&self) -> &str {
        self.version.as_deref().unwrap_or("")
    }
}

/// Title/artist/version/parts as submitted by an editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongDraft {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Missing builtin parts are restored empty
    #[serde(default)]
    pub parts: Vec<PartAssignment>,
}

/// A draft that passed validation, with trimmed fields and canonical parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSong {
    pub title: String,
    pub artist: String,
    pub version: Option<String>,
    pub parts: Vec<PartAssignment>,
}

impl ValidSong {
    /// Attach an identifier
    pub fn into_song(self, id: SongId) -> Song {
        Song {
            id,
            title: self.title,
            artist: self.artist,
            version: self.version,
            parts: self.parts,
        }
    }
}

impl SongDraft {
    /// Check required fields and put the parts into canonical order.
    ///
    /// Builtin parts come first in their fixed order with their fixed
    /// labels, then custom parts in submitted order. Custom keys are
    /// derived from the label when absent and suffixed until unique.
    pub fn validate(self) -> Result<ValidSong> {
        let title = self.title.trim().to_string();
        let artist = self.artist.trim().to_string();
        if title.is_empty() || artist.is_empty() {
            return Err(ClubError::validation("title and artist are required"));
        }
        let version = self
            .version
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let mut submitted = self.parts;
        let mut parts = Vec::with_capacity(submitted.len().max(DEFAULT_PARTS.len()));
        let mut used = HashSet::new();

        for default in &DEFAULT_PARTS {
            let mut part = match submitted.iter().position(|p| p.key == default.key) {
                Some(idx) => submitted.remove(idx),
                None => PartAssignment::from_default(default),
            };
            part.label = default.label.to_string();
            part.builtin = true;
            trim_fields(&mut part);
            used.insert(part.key.clone());
            parts.push(part);
        }

        for mut part in submitted {
            let label = part.label.trim().to_string();
            let base = if part.key.trim().is_empty() {
                slugify(if label.is_empty() { "part" } else { &label })
            } else {
                part.key.trim().to_string()
            };
            part.key = unique_key(&base, &used);
            part.label = if label.is_empty() { part.key.clone() } else { label };
            part.builtin = false;
            trim_fields(&mut part);
            used.insert(part.key.clone());
            parts.push(part);
        }

        Ok(ValidSong {
            title,
            artist,
            version,
            parts,
        })
    }
}

fn trim_fields(part: &mut PartAssignment) {
    part.player = part.player.trim().to_string();
    part.reference = part.reference.trim().to_string();
    part.misc = part.misc.trim().to_string();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(parts: Vec<PartAssignment>) -> SongDraft {
        SongDraft {
            title: " Song A ".into(),
            artist: "Band X".into(),
            version: Some("  ".into()),
            parts,
        }
    }

    #[test]
    fn validate_requires_title_and_artist() {
        let err = SongDraft {
            title: "   ".into(),
            artist: "Band".into(),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ClubError::Validation(_)));
    }

    #[test]
    fn validate_restores_missing_builtins_in_order() {
        let valid = draft(vec![]).validate().unwrap();
        assert_eq!(valid.title, "Song A");
        assert_eq!(valid.version, None);
        let keys: Vec<_> = valid.parts.iter().map(|p| p.key.as_str()).collect();
        let expected: Vec<_> = DEFAULT_PARTS.iter().map(|d| d.key).collect();
        assert_eq!(keys, expected);
        assert!(valid.parts.iter().all(|p| p.builtin));
    }

    #[test]
    fn validate_keeps_builtin_values_and_appends_customs() {
        let mut vocal = PartAssignment::from_default(&DEFAULT_PARTS[7]);
        vocal.player = " 철수 ".into();
        vocal.label = "renamed".into();
        let custom = PartAssignment::custom("", "Percussion");
        let valid = draft(vec![custom, vocal]).validate().unwrap();

        let vocal = valid.parts.iter().find(|p| p.key == "Vocal1").unwrap();
        assert_eq!(vocal.player, "철수");
        assert_eq!(vocal.label, "보컬 1");

        let last = valid.parts.last().unwrap();
        assert_eq!(last.key, "percussion");
        assert!(!last.builtin);
    }

    #[test]
    fn validate_suffixes_colliding_custom_keys() {
        let parts = vec![
            PartAssignment::custom("cajon", "Cajon"),
            PartAssignment::custom("cajon", "Cajon"),
            PartAssignment::custom("", "Cajon"),
        ];
        let valid = draft(parts).validate().unwrap();
        let custom: Vec<_> = valid
            .parts
            .iter()
            .filter(|p| !p.builtin)
            .map(|p| p.key.as_str())
            .collect();
        assert_eq!(custom, vec!["cajon", "cajon-2", "cajon-3"]);
    }

    #[test]
    fn player_tokens_split_on_all_separators() {
        let names: Vec<_> = player_tokens("민수, 철수/영희 & 지수,,").collect();
        assert_eq!(names, vec!["민수", "철수", "영희", "지수"]);
    }
}
