//! View renderers
//!
//! Each renderer is a pure projection of the current collections plus the
//! local filter state. Callers re-run them after every change instead of
//! patching previous output.

pub mod admin;
pub mod board;
pub mod person;
pub mod playlist;

use chrono::{DateTime, Local, TimeZone, Utc};

/// Maximum number of autocomplete entries
pub const SUGGESTION_LIMIT: usize = 8;

/// `YYYY-MM-DD HH:MM` in the local time zone
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    format_timestamp_in(ts, &Local)
}

/// `YYYY-MM-DD HH:MM` in `tz`
pub fn format_timestamp_in<Tz: TimeZone>(ts: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string()
}

/// Case-insensitive substring test with an already lowercased needle
pub(crate) fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_format_is_minute_precision() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 59).unwrap();
        assert_eq!(format_timestamp_in(ts, &Utc), "2024-03-05 09:07");
    }
}
