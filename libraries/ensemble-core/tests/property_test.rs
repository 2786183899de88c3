//! Property-based tests for song normalization and part keys
//!
//! Uses proptest to verify invariants across many random inputs.

use ensemble_core::collate;
use ensemble_core::normalize::{normalize_value, renormalize};
use ensemble_core::PartsEditor;
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

// ===== Helpers =====

fn arbitrary_label() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z ]{1,12}",
        "[가-힣 ]{1,6}",
        "[A-Za-z0-9가-힣!?. -]{1,12}",
        Just("Bass".to_string()),
        Just("cajon".to_string()),
    ]
}

fn arbitrary_stored_part() -> impl Strategy<Value = Value> {
    (
        proptest::option::of(arbitrary_label()),
        proptest::option::of(arbitrary_label()),
        proptest::option::of("[가-힣, /&]{0,10}"),
        any::<bool>(),
    )
        .prop_map(|(key, label, player, builtin)| {
            let mut part = Map::new();
            if let Some(key) = key {
                part.insert("key".into(), Value::String(key));
            }
            if let Some(label) = label {
                part.insert("label".into(), Value::String(label));
            }
            if let Some(player) = player {
                part.insert("player".into(), Value::String(player));
            }
            part.insert("builtin".into(), Value::Bool(builtin));
            Value::Object(part)
        })
}

fn arbitrary_parts() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::collection::vec(arbitrary_stored_part(), 0..15).prop_map(Value::Array),
        prop::collection::hash_map(
            prop_oneof![arbitrary_label(), Just("Vocal1".to_string())],
            "[가-힣]{0,4}".prop_map(|p| json!({ "player": p })),
            0..8
        )
        .prop_map(|map| Value::Object(map.into_iter().collect())),
        Just(Value::Null),
    ]
}

// ===== Property Tests =====

proptest! {
    /// Property: normalizing twice equals normalizing once
    #[test]
    fn normalize_is_idempotent(parts in arbitrary_parts()) {
        let raw = json!({ "id": "s1", "title": "t", "artist": "a", "parts": parts });
        let once = normalize_value(raw).unwrap();
        let twice = renormalize(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Property: normalized part keys are unique within a song
    #[test]
    fn normalized_keys_are_unique(parts in arbitrary_parts()) {
        let raw = json!({ "id": "s1", "title": "t", "artist": "a", "parts": parts });
        let song = normalize_value(raw).unwrap();
        let keys: HashSet<_> = song.parts.iter().map(|p| p.key.as_str()).collect();
        prop_assert_eq!(keys.len(), song.parts.len());
    }

    /// Property: custom parts added to one song always get distinct keys
    #[test]
    fn added_part_keys_are_pairwise_distinct(
        labels in prop::collection::vec(arbitrary_label(), 1..20)
    ) {
        let mut editor = PartsEditor::new();
        let mut added = Vec::new();
        for label in &labels {
            if let Ok(key) = editor.add_part(label) {
                added.push(key);
            }
        }
        let all: HashSet<_> = editor.parts().iter().map(|p| p.key.clone()).collect();
        prop_assert_eq!(all.len(), editor.parts().len());
        let distinct: HashSet<_> = added.iter().collect();
        prop_assert_eq!(distinct.len(), added.len());
    }

    /// Property: collation is a total order consistent with its reverse
    #[test]
    fn collation_is_antisymmetric(a in "[A-Za-z0-9가-힣 ]{0,10}", b in "[A-Za-z0-9가-힣 ]{0,10}") {
        prop_assert_eq!(collate::compare(&a, &b), collate::compare(&b, &a).reverse());
    }
}
