//! Part key generation from human labels

use std::collections::HashSet;
use uuid::Uuid;

fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || is_hangul_syllable(c)
}

/// Turn a label into a part key.
///
/// Whitespace runs become `-`, anything outside ASCII word characters,
/// `-` and Hangul syllables is dropped, repeated `-` collapse, and the
/// result is lowercased. A label with nothing usable left gets a random
/// `p-xxxxx` key.
pub fn slugify(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut in_space = false;

    for c in label.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if is_key_char(c) {
            out.push(c);
        }
    }

    let mut collapsed = String::with_capacity(out.len());
    for c in out.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }

    let slug = collapsed.to_lowercase();
    if slug.is_empty() {
        let random = Uuid::new_v4().simple().to_string();
        format!("p-{}", &random[..5])
    } else {
        slug
    }
}

/// Suffix `base` with `-2`, `-3`, … until it is not in `used`.
pub fn unique_key(base: &str, used: &HashSet<String>) -> String {
    if !used.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|i| format!("{}-{}", base, i))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("  Lead  Guitar "), "lead-guitar");
        assert_eq!(slugify("Synth/Pad #2"), "synthpad-2");
    }

    #[test]
    fn slugify_keeps_hangul() {
        assert_eq!(slugify("코러스 1"), "코러스-1");
        assert_eq!(slugify("퍼커션!!"), "퍼커션");
    }

    #[test]
    fn slugify_collapses_hyphen_runs() {
        assert_eq!(slugify("a - - b"), "a-b");
        assert_eq!(slugify("x--y"), "x-y");
    }

    #[test]
    fn slugify_falls_back_to_random_key() {
        let key = slugify("!!!");
        assert!(key.starts_with("p-"));
        assert_eq!(key.len(), 7);
    }

    #[test]
    fn unique_key_appends_increasing_suffix() {
        let mut used = HashSet::new();
        assert_eq!(unique_key("cajon", &used), "cajon");
        used.insert("cajon".to_string());
        assert_eq!(unique_key("cajon", &used), "cajon-2");
        used.insert("cajon-2".to_string());
        assert_eq!(unique_key("cajon", &used), "cajon-3");
    }
}
