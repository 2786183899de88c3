//! Authorization
//!
//! Every privileged operation is gated through [`Policy::authorize`], which
//! looks only at the acting identity's role and name. Views use
//! [`Policy::visible_tabs`] and never decide access on their own.

use crate::error::{AuthFailure, ClubError, Result};
use crate::types::{Role, User, UserId};
use serde::{Deserialize, Serialize};

/// The identity an operation is performed as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Who may change the playlist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SongEditing {
    /// Any signed-in member (local mode)
    #[default]
    AnyMember,
    /// Admins only (cloud mode)
    AdminOnly,
}

/// Operation being gated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    /// Any write by a signed-in member
    Write,
    EditSongs,
    ManageUsers,
    ReviewSignups,
    ReviewLogs,
    /// Edit or delete a post written by `author`
    ModifyPost { author: &'a str },
    /// Edit or delete a comment written by `author`
    ModifyComment { author: &'a str },
}

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Playlist,
    Board,
    Admin,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policy {
    pub song_editing: SongEditing,
}

impl Policy {
    pub fn new(song_editing: SongEditing) -> Self {
        Self { song_editing }
    }

    /// Whether `actor` may perform `action`
    pub fn allows(&self, actor: Option<&Actor>, action: Action<'_>) -> bool {
        self.authorize(actor, action).is_ok()
    }

    /// Refuse `action` unless `actor` holds the needed role.
    ///
    /// No actor at all is an authentication failure, not a permission one.
    pub fn authorize(&self, actor: Option<&Actor>, action: Action<'_>) -> Result<()> {
        let actor = actor.ok_or(AuthFailure::NotSignedIn)?;
        let allowed = match action {
            Action::Write => true,
            Action::EditSongs => match self.song_editing {
                SongEditing::AnyMember => true,
                SongEditing::AdminOnly => actor.is_admin(),
            },
            Action::ManageUsers | Action::ReviewSignups | Action::ReviewLogs => actor.is_admin(),
            Action::ModifyPost { author } | Action::ModifyComment { author } => {
                actor.is_admin() || actor.name == author
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(ClubError::permission_denied(denial_message(action)))
        }
    }

    /// Screens available to `actor`
    pub fn visible_tabs(&self, actor: Option<&Actor>) -> Vec<Tab> {
        match actor {
            None => Vec::new(),
            Some(a) if a.is_admin() => vec![Tab::Playlist, Tab::Board, Tab::Admin],
            Some(_) => vec![Tab::Playlist, Tab::Board],
        }
    }
}

fn denial_message(action: Action<'_>) -> &'static str {
    match action {
        Action::Write => "sign-in required",
        Action::EditSongs => "only admins can edit the playlist",
        Action::ManageUsers => "only admins can manage users",
        Action::ReviewSignups => "only admins can review signups",
        Action::ReviewLogs => "only admins can view logs",
        Action::ModifyPost { .. } => "only the author or an admin can change this post",
        Action::ModifyComment { .. } => "only the author or an admin can change this comment",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(name: &str, role: Role) -> Actor {
        Actor {
            id: UserId::new(name),
            name: name.into(),
            role,
        }
    }

    #[test]
    fn anonymous_is_not_signed_in() {
        let err = Policy::default()
            .authorize(None, Action::Write)
            .unwrap_err();
        assert!(matches!(err, ClubError::Auth(AuthFailure::NotSignedIn)));
    }

    #[test]
    fn song_editing_follows_mode() {
        let member = actor("민수", Role::Member);
        assert!(Policy::new(SongEditing::AnyMember).allows(Some(&member), Action::EditSongs));
        assert!(!Policy::new(SongEditing::AdminOnly).allows(Some(&member), Action::EditSongs));
        let admin = actor("admin", Role::Admin);
        assert!(Policy::new(SongEditing::AdminOnly).allows(Some(&admin), Action::EditSongs));
    }

    #[test]
    fn authors_and_admins_modify_posts() {
        let policy = Policy::default();
        let author = actor("민수", Role::Member);
        let other = actor("철수", Role::Member);
        let admin = actor("admin", Role::Admin);
        let action = Action::ModifyPost { author: "민수" };
        assert!(policy.allows(Some(&author), action));
        assert!(policy.allows(Some(&admin), action));
        let err = policy.authorize(Some(&other), action).unwrap_err();
        assert!(matches!(err, ClubError::PermissionDenied(_)));
    }

    #[test]
    fn admin_tab_only_for_admins() {
        let policy = Policy::default();
        assert!(policy.visible_tabs(None).is_empty());
        assert_eq!(
            policy.visible_tabs(Some(&actor("민수", Role::Member))),
            vec![Tab::Playlist, Tab::Board]
        );
        assert!(policy
            .visible_tabs(Some(&actor("admin", Role::Admin)))
            .contains(&Tab::Admin));
    }
}
