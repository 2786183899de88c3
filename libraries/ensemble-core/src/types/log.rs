//! Audit log entries
//!
//! The log is stored newest-first and never holds more than
//! [`LOG_CAPACITY`] entries; appending past the bound drops the oldest.

use super::ids::LogId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Maximum number of retained entries
pub const LOG_CAPACITY: usize = 500;

/// Number of entries the admin table shows
pub const LOG_VIEW_LIMIT: usize = 300;

/// Actor recorded for actions taken without a session
pub const SYSTEM_ACTOR: &str = "system";

/// Stable action tags
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogAction {
    BootstrapAdmin,
    SignupRequested,
    SignupApproved,
    SignupRejected,
    SignupAutoApproved,
    UserAdded,
    UserEdited,
    UserDeleted,
    PasswordReset,
    SelfEdited,
    SelfPasswordChanged,
    SongAdded,
    SongEdited,
    SongDeleted,
    PostAdded,
    PostEdited,
    PostDeleted,
    CommentAdded,
    CommentEdited,
    CommentDeleted,
    /// Tag written by a newer version, kept verbatim
    Unknown(String),
}

impl LogAction {
    pub fn as_str(&self) -> &str {
        match self {
            LogAction::BootstrapAdmin => "bootstrap_admin",
            LogAction::SignupRequested => "signup_requested",
            LogAction::SignupApproved => "signup_approved",
            LogAction::SignupRejected => "signup_rejected",
            LogAction::SignupAutoApproved => "signup_auto_approved",
            LogAction::UserAdded => "user_added",
            LogAction::UserEdited => "user_edited",
            LogAction::UserDeleted => "user_deleted",
            LogAction::PasswordReset => "password_reset",
            LogAction::SelfEdited => "self_edited",
            LogAction::SelfPasswordChanged => "self_password_changed",
            LogAction::SongAdded => "song_added",
            LogAction::SongEdited => "song_edited",
            LogAction::SongDeleted => "song_deleted",
            LogAction::PostAdded => "post_added",
            LogAction::PostEdited => "post_edited",
            LogAction::PostDeleted => "post_deleted",
            LogAction::CommentAdded => "comment_added",
            LogAction::CommentEdited => "comment_edited",
            LogAction::CommentDeleted => "comment_deleted",
            LogAction::Unknown(tag) => tag.as_str(),
        }
    }

    /// Parse a stored tag. Never fails: unrecognized tags become `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "bootstrap_admin" => LogAction::BootstrapAdmin,
            "signup_requested" => LogAction::SignupRequested,
            "signup_approved" => LogAction::SignupApproved,
            "signup_rejected" => LogAction::SignupRejected,
            "signup_auto_approved" => LogAction::SignupAutoApproved,
            "user_added" => LogAction::UserAdded,
            "user_edited" => LogAction::UserEdited,
            "user_deleted" => LogAction::UserDeleted,
            "password_reset" => LogAction::PasswordReset,
            "self_edited" => LogAction::SelfEdited,
            "self_password_changed" => LogAction::SelfPasswordChanged,
            "song_added" => LogAction::SongAdded,
            "song_edited" => LogAction::SongEdited,
            "song_deleted" => LogAction::SongDeleted,
            "post_added" => LogAction::PostAdded,
            "post_edited" => LogAction::PostEdited,
            "post_deleted" => LogAction::PostDeleted,
            "comment_added" => LogAction::CommentAdded,
            "comment_edited" => LogAction::CommentEdited,
            "comment_deleted" => LogAction::CommentDeleted,
            other => LogAction::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LogAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(LogAction::from_tag(&tag))
    }
}

/// One audited action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
    pub actor: String,
    pub action: LogAction,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl LogEntry {
    pub fn new(actor: impl Into<String>, action: LogAction, meta: Value) -> Self {
        let meta = match meta {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: LogId::generate(),
            ts: Utc::now(),
            actor: actor.into(),
            action,
            meta,
        }
    }

    /// Metadata string field, empty when absent
    pub fn meta_str(&self, key: &str) -> &str {
        self.meta.get(key).and_then(Value::as_str).unwrap_or("")
    }

    pub fn export(&self) -> ExportedLog {
        ExportedLog {
            timestamp: self.ts,
            actor: self.actor.clone(),
            action: self.action.clone(),
            metadata: self.meta.clone(),
        }
    }
}

/// Export shape with a fixed field order
#[derive(Debug, Clone, Serialize)]
pub struct ExportedLog {
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: LogAction,
    pub metadata: Map<String, Value>,
}

/// Put `entry` at the front and drop whatever falls past the bound.
pub fn append_bounded(logs: &mut Vec<LogEntry>, entry: LogEntry) {
    logs.insert(0, entry);
    logs.truncate(LOG_CAPACITY);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn append_keeps_newest_and_bounds_length() {
        let mut logs = Vec::new();
        for i in 0..LOG_CAPACITY + 20 {
            append_bounded(
                &mut logs,
                LogEntry::new("admin", LogAction::SongAdded, json!({ "seq": i })),
            );
        }
        assert_eq!(logs.len(), LOG_CAPACITY);
        assert_eq!(logs[0].meta["seq"], json!(LOG_CAPACITY + 19));
        // entries 0..20 were the oldest and are gone
        assert_eq!(logs[LOG_CAPACITY - 1].meta["seq"], json!(20));
    }

    #[test]
    fn unknown_tag_decodes() {
        let raw = json!({
            "id": "l1", "ts": 0, "actor": "system", "action": "theme_changed", "meta": {}
        });
        let entry: LogEntry = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(entry.action, LogAction::Unknown("theme_changed".into()));
        assert_eq!(serde_json::to_value(&entry).unwrap()["action"], raw["action"]);
    }

    #[test]
    fn tags_match_serde_names() {
        for action in [
            LogAction::BootstrapAdmin,
            LogAction::SelfPasswordChanged,
            LogAction::CommentDeleted,
        ] {
            let tag = serde_json::to_value(&action).unwrap();
            assert_eq!(tag, json!(action.as_str()));
            assert_eq!(serde_json::from_value::<LogAction>(tag).unwrap(), action);
        }
    }

    #[test]
    fn export_field_order_is_stable() {
        let entry = LogEntry::new("민수", LogAction::PostAdded, json!({ "title": "hi" }));
        let text = serde_json::to_string(&entry.export()).unwrap();
        let ts = text.find("\"timestamp\"").unwrap();
        let actor = text.find("\"actor\"").unwrap();
        let action = text.find("\"action\"").unwrap();
        let meta = text.find("\"metadata\"").unwrap();
        assert!(ts < actor && actor < action && action < meta);
    }
}
