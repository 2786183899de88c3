//! Admin tables: pending signups, accounts, audit log

use super::format_timestamp;
use crate::collate;
use crate::types::{LogAction, LogEntry, Signup, User, UserId, LOG_VIEW_LIMIT};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRow {
    pub id: UserId,
    pub name: String,
    pub dept: String,
    pub part: String,
    pub requested_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: UserId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub dept: String,
    pub part: String,
    pub created_at: String,
    pub approved: bool,
    /// False for admin accounts, which are managed separately
    pub manageable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRow {
    pub when: String,
    pub actor: String,
    pub description: String,
    /// Compact JSON of the metadata
    pub detail: String,
}

/// Pending signups, earliest request first
pub fn render_signups(signups: &[Signup]) -> Vec<SignupRow> {
    let mut sorted: Vec<&Signup> = signups.iter().collect();
    sorted.sort_by_key(|s| s.created_at);
    sorted
        .into_iter()
        .map(|s| SignupRow {
            id: s.id.clone(),
            name: s.name.clone(),
            dept: s.dept.clone(),
            part: s.part.label().to_string(),
            requested_at: format_timestamp(s.created_at),
        })
        .collect()
}

/// Accounts sorted by name
pub fn render_users(users: &[User]) -> Vec<UserRow> {
    let mut sorted: Vec<&User> = users.iter().collect();
    sorted.sort_by(|a, b| collate::compare(&a.name, &b.name));
    sorted
        .into_iter()
        .map(|u| UserRow {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
            dept: u.dept.clone(),
            part: u.part.label().to_string(),
            created_at: format_timestamp(u.created_at),
            approved: u.approved,
            manageable: !u.is_admin(),
        })
        .collect()
}

/// The newest entries of the log, already stored newest first
pub fn render_logs(logs: &[LogEntry]) -> Vec<LogRow> {
    logs.iter()
        .take(LOG_VIEW_LIMIT)
        .map(|entry| LogRow {
            when: format_timestamp(entry.ts),
            actor: if entry.actor.is_empty() {
                "-".to_string()
            } else {
                entry.actor.clone()
            },
            description: describe(entry),
            detail: serde_json::Value::Object(entry.meta.clone()).to_string(),
        })
        .collect()
}

/// Human-readable one-line summary of a log entry
pub fn describe(entry: &LogEntry) -> String {
    let m = |key: &str| entry.meta_str(key);
    match &entry.action {
        LogAction::BootstrapAdmin => "관리자 계정 초기 생성".to_string(),
        LogAction::SignupRequested => format!("가입 신청: {}", m("name")),
        LogAction::SignupApproved => format!("가입 승인: {}", m("name")),
        LogAction::SignupRejected => format!("가입 거절: {}", m("name")),
        LogAction::SignupAutoApproved => format!("가입 자동 승인: {}", m("name")),
        LogAction::UserAdded => format!("사용자 추가: {}", m("name")),
        LogAction::UserEdited => format!("사용자 수정: {} → {}", m("oldName"), m("newName")),
        LogAction::UserDeleted => format!("사용자 삭제: {}", m("name")),
        LogAction::PasswordReset => format!("비번 초기화: {}", m("name")),
        LogAction::SelfEdited => format!("내 정보 수정: {} → {}", m("oldName"), m("newName")),
        LogAction::SelfPasswordChanged => "내 비밀번호 변경".to_string(),
        LogAction::SongAdded => format!("곡 추가: {} / {}", m("title"), m("artist")),
        LogAction::SongEdited => format!("곡 수정: {} / {}", m("title"), m("artist")),
        LogAction::SongDeleted => format!("곡 삭제: {} / {}", m("title"), m("artist")),
        LogAction::PostAdded => format!("글 등록: {}", m("title")),
        LogAction::PostEdited => format!("글 수정: {}", m("title")),
        LogAction::PostDeleted => format!("글 삭제: {}", m("title")),
        LogAction::CommentAdded => format!("댓글 등록: {}", m("postTitle")),
        LogAction::CommentEdited => format!("댓글 수정: {}", m("postTitle")),
        LogAction::CommentDeleted => format!("댓글 삭제: {}", m("postTitle")),
        LogAction::Unknown(tag) => tag.clone(),
    }
}
