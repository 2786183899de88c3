//! Club-level settings

use ensemble_core::{Backend, SongEditing};
use serde::{Deserialize, Serialize};

/// How the club runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubConfig {
    /// Backend flavor; decides login identifiers and who edits songs
    pub mode: Backend,
    /// New registrations wait for an admin instead of being approved at once
    pub require_approval: bool,
    /// Sentinel credential for the `admin` account
    pub admin_password: String,
    /// Address that is made admin on registration in cloud mode
    pub admin_email: Option<String>,
}

impl ClubConfig {
    pub fn local(admin_password: impl Into<String>) -> Self {
        Self {
            mode: Backend::Local,
            require_approval: true,
            admin_password: admin_password.into(),
            admin_email: None,
        }
    }

    pub fn cloud(admin_password: impl Into<String>, admin_email: impl Into<String>) -> Self {
        Self {
            mode: Backend::Cloud,
            require_approval: true,
            admin_password: admin_password.into(),
            admin_email: Some(admin_email.into()),
        }
    }

    pub fn song_editing(&self) -> SongEditing {
        match self.mode {
            Backend::Local => SongEditing::AnyMember,
            Backend::Cloud => SongEditing::AdminOnly,
        }
    }

    pub(crate) fn is_admin_email(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .is_some_and(|admin| admin.eq_ignore_ascii_case(email.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_mode_restricts_song_editing() {
        assert_eq!(ClubConfig::local("pw").song_editing(), SongEditing::AnyMember);
        assert_eq!(
            ClubConfig::cloud("pw", "a@b.c").song_editing(),
            SongEditing::AdminOnly
        );
    }

    #[test]
    fn admin_email_ignores_case_and_padding() {
        let config = ClubConfig::cloud("pw", "Admin@Club.test");
        assert!(config.is_admin_email(" admin@club.test "));
        assert!(!config.is_admin_email("member@club.test"));
        assert!(!ClubConfig::local("pw").is_admin_email("admin@club.test"));
    }
}
