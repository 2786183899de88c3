//! Working copy of a song's parts while it is being edited

use crate::error::{ClubError, Result};
use crate::slug::{slugify, unique_key};
use crate::types::{default_parts, PartAssignment, Song, SongDraft};
use std::collections::HashSet;

/// Field of a part assignment the editor can set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartField {
    Player,
    Reference,
    Misc,
}

/// Editable list of part assignments.
///
/// Builtin parts can be filled in but never removed. Custom parts get a
/// key derived from their label that is unique within the song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartsEditor {
    parts: Vec<PartAssignment>,
}

impl Default for PartsEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl PartsEditor {
    /// Editor for a new song: the ten builtin parts, all empty
    pub fn new() -> Self {
        Self {
            parts: default_parts(),
        }
    }

    /// Editor seeded from an existing song
    pub fn for_song(song: &Song) -> Self {
        Self {
            parts: song.parts.clone(),
        }
    }

    pub fn parts(&self) -> &[PartAssignment] {
        &self.parts
    }

    /// Add a custom part and return its key.
    pub fn add_part(&mut self, label: &str) -> Result<String> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ClubError::validation("part name is required"));
        }
        let used: HashSet<String> = self.parts.iter().map(|p| p.key.clone()).collect();
        let key = unique_key(&slugify(label), &used);
        self.parts.push(PartAssignment::custom(key.clone(), label));
        Ok(key)
    }

    /// Remove a custom part. Builtin parts are refused.
    pub fn remove_part(&mut self, key: &str) -> Result<()> {
        let idx = self
            .parts
            .iter()
            .position(|p| p.key == key)
            .ok_or_else(|| ClubError::not_found("Part", key))?;
        if self.parts[idx].builtin {
            return Err(ClubError::validation("builtin parts cannot be removed"));
        }
        self.parts.remove(idx);
        Ok(())
    }

    /// Set one field of a part; the value is trimmed.
    pub fn set(&mut self, key: &str, field: PartField, value: &str) -> Result<()> {
        let part = self
            .parts
            .iter_mut()
            .find(|p| p.key == key)
            .ok_or_else(|| ClubError::not_found("Part", key))?;
        let value = value.trim().to_string();
        match field {
            PartField::Player => part.player = value,
            PartField::Reference => part.reference = value,
            PartField::Misc => part.misc = value,
        }
        Ok(())
    }

    /// Bundle the edited parts with the song fields into a draft.
    pub fn into_draft(
        self,
        title: impl Into<String>,
        artist: impl Into<String>,
        version: Option<String>,
    ) -> SongDraft {
        SongDraft {
            title: title.into(),
            artist: artist.into(),
            version,
            parts: self.parts,
        }
    }
}
