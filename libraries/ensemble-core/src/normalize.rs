//! Migration of stored song shapes into the canonical part list
//!
//! Songs have been persisted with two part layouts over time: a list of
//! assignment objects, and an older object keyed by part key. Both decode
//! into [`StoredSong`] and are turned into a [`Song`] whose parts are a
//! list with unique keys. Normalizing an already canonical song returns it
//! unchanged.

use crate::slug::{slugify, unique_key};
use crate::types::{is_builtin_key, PartAssignment, Song, SongId, DEFAULT_PARTS};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::warn;

/// Label given to list entries stored without label or key
const FALLBACK_LABEL: &str = "파트";

/// Part assignment as it may appear in storage, every field optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoredPart {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub player: Option<String>,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub misc: Option<String>,
    #[serde(default)]
    pub builtin: bool,
}

/// The layouts `parts` has been stored in
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredParts {
    /// Current layout
    List(Vec<StoredPart>),
    /// Legacy layout keyed by part key
    Keyed(Map<String, Value>),
    /// Anything else is treated as "no parts"
    Other(Value),
}

/// Song record as it may appear in storage
#[derive(Debug, Clone, Deserialize)]
pub struct StoredSong {
    pub id: SongId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub parts: Option<StoredParts>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn from_list(stored: Vec<StoredPart>) -> Vec<PartAssignment> {
    let mut used = HashSet::new();
    stored
        .into_iter()
        .map(|p| {
            let key = non_empty(p.key.clone())
                .unwrap_or_else(|| slugify(p.label.as_deref().unwrap_or("part")));
            let key = unique_key(&key, &used);
            used.insert(key.clone());
            let label = non_empty(p.label)
                .or_else(|| non_empty(p.key))
                .unwrap_or_else(|| FALLBACK_LABEL.to_string());
            PartAssignment {
                builtin: p.builtin && is_builtin_key(&key),
                key,
                label,
                player: p.player.unwrap_or_default(),
                reference: p.reference.unwrap_or_default(),
                misc: p.misc.unwrap_or_default(),
            }
        })
        .collect()
}

fn keyed_values(value: Option<&Value>) -> StoredPart {
    value
        .and_then(|v| serde_json::from_value::<StoredPart>(v.clone()).ok())
        .unwrap_or_default()
}

fn from_keyed(mut stored: Map<String, Value>) -> Vec<PartAssignment> {
    let mut parts = Vec::with_capacity(DEFAULT_PARTS.len() + stored.len());

    for default in &DEFAULT_PARTS {
        let values = keyed_values(stored.remove(default.key).as_ref());
        let mut part = PartAssignment::from_default(default);
        part.player = values.player.unwrap_or_default();
        part.reference = values.reference.unwrap_or_default();
        part.misc = values.misc.unwrap_or_default();
        parts.push(part);
    }

    for (key, value) in stored {
        let values = keyed_values(Some(&value));
        let mut part = PartAssignment::custom(key.clone(), key);
        part.player = values.player.unwrap_or_default();
        part.reference = values.reference.unwrap_or_default();
        part.misc = values.misc.unwrap_or_default();
        parts.push(part);
    }

    parts
}

/// Produce the canonical form of a stored song.
pub fn normalize_song(stored: StoredSong) -> Song {
    let parts = match stored.parts {
        Some(StoredParts::List(list)) => from_list(list),
        Some(StoredParts::Keyed(map)) => from_keyed(map),
        Some(StoredParts::Other(_)) | None => from_keyed(Map::new()),
    };
    Song {
        id: stored.id,
        title: stored.title,
        artist: stored.artist,
        version: non_empty(stored.version),
        parts,
    }
}

/// Decode and normalize a single raw stored song.
pub fn normalize_value(value: Value) -> crate::Result<Song> {
    let stored: StoredSong = serde_json::from_value(value)?;
    Ok(normalize_song(stored))
}

/// Whether a raw stored element decodes as a song of any known layout
pub fn is_song(value: &Value) -> bool {
    StoredSong::deserialize(value).is_ok()
}

/// Normalize a whole stored playlist, leaving out entries that cannot be
/// decoded. Writers keep those entries in the store via [`is_song`].
pub fn normalize_all(values: Vec<Value>) -> Vec<Song> {
    values
        .into_iter()
        .filter_map(|value| match normalize_value(value) {
            Ok(song) => Some(song),
            Err(e) => {
                warn!(error = %e, "Leaving undecodable stored song out of the playlist");
                None
            }
        })
        .collect()
}

/// Re-normalize an in-memory song, as when a snapshot is replayed.
pub fn renormalize(song: &Song) -> crate::Result<Song> {
    normalize_value(serde_json::to_value(song)?)
}
