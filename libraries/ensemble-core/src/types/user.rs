//! User, signup and session types
use super::ids::UserId;
use crate::error::{ClubError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker value meaning "the member typed their own part"
pub const CUSTOM_PART: &str = "직접입력";

/// Name of the bootstrap admin account in local mode
pub const ADMIN_NAME: &str = "admin";

/// Part label used for the admin account
pub const ADMIN_PART: &str = "관리자";

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }
}

/// Stored `part`/`partCustom` pair behind [`MemberPart`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartFields {
    #[serde(default)]
    pub part: String,
    #[serde(rename = "partCustom", default)]
    pub part_custom: String,
}

/// What a member plays: one of the preset labels, or free text.
///
/// Stored as the `part`/`partCustom` pair, where `part == "직접입력"`
/// selects the free-text value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PartFields", into = "PartFields")]
pub enum MemberPart {
    Preset(String),
    Custom(String),
}

impl Default for MemberPart {
    fn default() -> Self {
        MemberPart::Preset("일렉기타".to_string())
    }
}

impl From<PartFields> for MemberPart {
    fn from(fields: PartFields) -> Self {
        if fields.part == CUSTOM_PART {
            MemberPart::Custom(fields.part_custom)
        } else {
            MemberPart::Preset(fields.part)
        }
    }
}

impl From<MemberPart> for PartFields {
    fn from(part: MemberPart) -> Self {
        match part {
            MemberPart::Preset(part) => PartFields {
                part,
                part_custom: String::new(),
            },
            MemberPart::Custom(text) => PartFields {
                part: CUSTOM_PART.to_string(),
                part_custom: text,
            },
        }
    }
}

impl MemberPart {
    /// Build from the raw select value and free-text box
    pub fn from_input(part: &str, custom: &str) -> Self {
        PartFields {
            part: part.trim().to_string(),
            part_custom: custom.trim().to_string(),
        }
        .into()
    }

    /// Label shown in tables
    pub fn label(&self) -> &str {
        match self {
            MemberPart::Preset(p) => p,
            MemberPart::Custom(c) if c.is_empty() => CUSTOM_PART,
            MemberPart::Custom(c) => c,
        }
    }

    /// Free-text parts must actually carry text
    pub fn validate(&self) -> Result<()> {
        match self {
            MemberPart::Custom(c) if c.trim().is_empty() => {
                Err(ClubError::validation("enter the part name"))
            }
            _ => Ok(()),
        }
    }
}

fn default_approved() -> bool {
    true
}

/// Registered account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Credential hash
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub dept: String,
    #[serde(flatten)]
    pub part: MemberPart,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub role: Role,
    /// Always true for local accounts, which wait in the signup list instead
    #[serde(default = "default_approved")]
    pub approved: bool,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Login identifier: email when present, otherwise the display name
    pub fn login(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.name)
    }
}

/// Local-mode registration waiting for admin approval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub dept: String,
    #[serde(flatten)]
    pub part: MemberPart,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Signup {
    /// Promote to an approved member account
    pub fn into_user(self, approved_at: DateTime<Utc>) -> User {
        User {
            id: UserId::generate(),
            name: self.name,
            email: None,
            hash: self.hash,
            dept: self.dept,
            part: self.part,
            created_at: approved_at,
            role: Role::Member,
            approved: true,
        }
    }
}

/// Persisted identity of the signed-in actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_user_record_decodes() {
        let raw = json!({
            "id": "id-abc",
            "name": "민수",
            "hash": "deadbeef",
            "dept": "컴공",
            "part": CUSTOM_PART,
            "partCustom": "카혼",
            "createdAt": 1_700_000_000_000_i64
        });
        let user: User = serde_json::from_value(raw).unwrap();
        assert_eq!(user.part, MemberPart::Custom("카혼".into()));
        assert_eq!(user.part.label(), "카혼");
        assert_eq!(user.role, Role::Member);
        assert!(user.approved);
        assert_eq!(user.login(), "민수");
    }

    #[test]
    fn member_part_serializes_as_field_pair() {
        let value = serde_json::to_value(MemberPart::Preset("드럼".into())).unwrap();
        assert_eq!(value, json!({ "part": "드럼", "partCustom": "" }));
    }

    #[test]
    fn empty_custom_part_is_invalid() {
        let part = MemberPart::from_input(CUSTOM_PART, "  ");
        assert!(part.validate().is_err());
        assert_eq!(part.label(), CUSTOM_PART);
        assert!(MemberPart::from_input("베이스", "").validate().is_ok());
    }

    #[test]
    fn approved_signup_becomes_member() {
        let signup = Signup {
            id: UserId::new("s-1"),
            name: "영희".into(),
            hash: "h".into(),
            dept: String::new(),
            part: MemberPart::default(),
            created_at: Utc::now(),
        };
        let user = signup.into_user(Utc::now());
        assert_eq!(user.name, "영희");
        assert_eq!(user.role, Role::Member);
        assert_ne!(user.id.as_str(), "s-1");
    }
}
