//! Korean-locale string ordering
//!
//! Every sorted view (song titles, player names, by-person rows, admin
//! tables) goes through [`compare`]. The order follows Korean collation at
//! base strength with numeric runs:
//!
//! - punctuation and spaces, then digit runs by value, then Hangul, then
//!   Han, then every other script (Latin last)
//! - case and accents are ignored, so "Éclair" equals "eclair"
//! - "2차" sorts before "10차"
//!
//! Equal keys keep their input order because callers use stable sorts.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::vec::IntoIter;
use unicode_normalization::char::{decompose_canonical, is_combining_mark};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Script {
    Symbol,
    Digit,
    Hangul,
    Han,
    Other,
}

enum Chunk {
    Digits(String),
    Char(char),
}

impl Chunk {
    fn script(&self) -> Script {
        match self {
            Chunk::Digits(_) => Script::Digit,
            Chunk::Char(c) => script_of(*c),
        }
    }
}

fn is_hangul(c: char) -> bool {
    matches!(c,
        '\u{AC00}'..='\u{D7A3}'
        | '\u{1100}'..='\u{11FF}'
        | '\u{3130}'..='\u{318F}'
        | '\u{A960}'..='\u{A97F}'
        | '\u{D7B0}'..='\u{D7FF}')
}

fn is_han(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2FA1F}')
}

fn script_of(c: char) -> Script {
    if is_hangul(c) {
        Script::Hangul
    } else if is_han(c) {
        Script::Han
    } else if c.is_alphanumeric() {
        Script::Other
    } else {
        Script::Symbol
    }
}

/// Lowercased base characters with accents stripped. Hangul syllables stay
/// composed so they compare in syllable order.
fn fold(s: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        if is_hangul(c) {
            out.push(c);
            continue;
        }
        decompose_canonical(c, |base| {
            if !is_combining_mark(base) {
                out.extend(base.to_lowercase());
            }
        });
    }
    out
}

fn next_chunk(chars: &mut Peekable<IntoIter<char>>) -> Option<Chunk> {
    let c = chars.next()?;
    if !c.is_ascii_digit() {
        return Some(Chunk::Char(c));
    }
    let mut digits = String::from(c);
    while let Some(d) = chars.next_if(char::is_ascii_digit) {
        digits.push(d);
    }
    Some(Chunk::Digits(digits))
}

fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_chunks(x: &Chunk, y: &Chunk) -> Ordering {
    x.script().cmp(&y.script()).then_with(|| match (x, y) {
        (Chunk::Digits(a), Chunk::Digits(b)) => compare_digits(a, b),
        (Chunk::Char(a), Chunk::Char(b)) => a.cmp(b),
        _ => Ordering::Equal,
    })
}

/// Compare two strings the way the club's views sort them.
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut left = fold(a).into_iter().peekable();
    let mut right = fold(b).into_iter().peekable();

    loop {
        let ordering = match (next_chunk(&mut left), next_chunk(&mut right)) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => compare_chunks(&x, &y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

/// Stable sort of `items` by the collation order of `key`.
pub fn sort_by_key<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| compare(key(a), key(b)));
}
