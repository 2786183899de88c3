//! The club's domain collections
//!
//! [`Club`] owns the in-memory mirror of every collection and is the only
//! way to change them. A mutation runs under one lock: it reads the current
//! stored collection, validates, then writes the changed collections and
//! one audit entry in a single store commit before replacing the mirror. A
//! failed step leaves both the store and the mirror untouched.

use crate::config::ClubConfig;
use crate::hasher::PasswordHasher;
use ensemble_core::normalize::{is_song, normalize_all};
use ensemble_core::store::undecodable;
use ensemble_core::types::{append_bounded, ADMIN_NAME, ADMIN_PART, SYSTEM_ACTOR};
use ensemble_core::{
    Actor, AuthFailure, Backend, Collection, CollectionStore, LogAction, LogEntry, MemberPart,
    Policy, Post, Result, Role, Signup, Song, User, UserId,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

/// In-memory copy of the persisted collections
#[derive(Debug, Clone, Default)]
pub(crate) struct Mirror {
    pub songs: Vec<Song>,
    pub users: Vec<User>,
    pub signups: Vec<Signup>,
    pub posts: Vec<Post>,
    pub logs: Vec<LogEntry>,
}

/// Collections replaced by one mutation
#[derive(Debug, Default)]
pub(crate) struct Changes {
    songs: Option<Vec<Song>>,
    users: Option<Vec<User>>,
    signups: Option<Vec<Signup>>,
    posts: Option<Vec<Post>>,
}

impl Changes {
    pub(crate) fn songs(mut self, songs: Vec<Song>) -> Self {
        self.songs = Some(songs);
        self
    }

    pub(crate) fn users(mut self, users: Vec<User>) -> Self {
        self.users = Some(users);
        self
    }

    pub(crate) fn signups(mut self, signups: Vec<Signup>) -> Self {
        self.signups = Some(signups);
        self
    }

    pub(crate) fn posts(mut self, posts: Vec<Post>) -> Self {
        self.posts = Some(posts);
        self
    }

    fn encode(&self) -> Result<Vec<(Collection, Value)>> {
        let mut writes = Vec::new();
        if let Some(songs) = &self.songs {
            writes.push((Collection::Songs, serde_json::to_value(songs)?));
        }
        if let Some(users) = &self.users {
            writes.push((Collection::Users, serde_json::to_value(users)?));
        }
        if let Some(signups) = &self.signups {
            writes.push((Collection::Signups, serde_json::to_value(signups)?));
        }
        if let Some(posts) = &self.posts {
            writes.push((Collection::Posts, serde_json::to_value(posts)?));
        }
        Ok(writes)
    }

    fn apply(self, state: &mut Mirror) {
        if let Some(songs) = self.songs {
            state.songs = songs;
        }
        if let Some(users) = self.users {
            state.users = users;
        }
        if let Some(signups) = self.signups {
            state.signups = signups;
        }
        if let Some(posts) = self.posts {
            state.posts = posts;
        }
    }
}

/// Club state and every operation on it
pub struct Club {
    pub(crate) store: Arc<dyn CollectionStore>,
    pub(crate) config: ClubConfig,
    pub(crate) policy: Policy,
    pub(crate) hasher: Arc<dyn PasswordHasher>,
    pub(crate) state: Mutex<Mirror>,
}

impl Club {
    /// Load every collection and make sure an admin account exists.
    pub async fn open(
        store: Arc<dyn CollectionStore>,
        config: ClubConfig,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Result<Self> {
        let club = Self {
            policy: Policy::new(config.song_editing()),
            store,
            config,
            hasher,
            state: Mutex::new(Mirror::default()),
        };
        club.reload().await?;
        club.bootstrap_admin().await?;

        let state = club.state.lock().await;
        info!(
            mode = ?club.config.mode,
            songs = state.songs.len(),
            users = state.users.len(),
            posts = state.posts.len(),
            "Club opened"
        );
        drop(state);
        Ok(club)
    }

    pub fn config(&self) -> &ClubConfig {
        &self.config
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<dyn CollectionStore> {
        &self.store
    }

    pub fn mode(&self) -> Backend {
        self.config.mode
    }

    /// Replace every mirror with what is stored now.
    pub async fn reload(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = Mirror {
            songs: self.load_songs().await?,
            users: self.load_users().await?,
            signups: self.load_signups().await?,
            posts: self.load_posts().await?,
            logs: self.load_logs().await?,
        };
        Ok(())
    }

    /// Remove all six collections from `store`.
    pub async fn reset_store(store: &dyn CollectionStore) -> Result<()> {
        for collection in Collection::ALL {
            store.remove(collection).await?;
        }
        warn!("All collections removed");
        Ok(())
    }

    // ========================================================================
    // Loading
    // ========================================================================

    pub(crate) async fn load_songs(&self) -> Result<Vec<Song>> {
        let raw: Vec<Value> = self.store.load_list(Collection::Songs).await?;
        Ok(normalize_all(raw))
    }

    pub(crate) async fn load_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.store.load_list(Collection::Users).await?;
        for user in &mut users {
            self.migrate_role(user);
        }
        Ok(users)
    }

    pub(crate) async fn load_signups(&self) -> Result<Vec<Signup>> {
        self.store.load_list(Collection::Signups).await
    }

    pub(crate) async fn load_posts(&self) -> Result<Vec<Post>> {
        self.store.load_list(Collection::Posts).await
    }

    pub(crate) async fn load_logs(&self) -> Result<Vec<LogEntry>> {
        self.store.load_list(Collection::Logs).await
    }

    /// Records written before roles existed identify the admin by name
    /// (local) or by the configured address (cloud).
    pub(crate) fn migrate_role(&self, user: &mut User) {
        let is_admin = match self.config.mode {
            Backend::Local => user.name == ADMIN_NAME,
            Backend::Cloud => user
                .email
                .as_deref()
                .is_some_and(|email| self.config.is_admin_email(email)),
        };
        if is_admin && user.role != Role::Admin {
            user.role = Role::Admin;
            user.approved = true;
        }
    }

    async fn bootstrap_admin(&self) -> Result<()> {
        let mut state = self.lock().await;
        if state.users.iter().any(User::is_admin) {
            return Ok(());
        }
        let email = match self.config.mode {
            Backend::Local => None,
            Backend::Cloud => match &self.config.admin_email {
                Some(email) => Some(email.trim().to_lowercase()),
                None => {
                    warn!("No admin address configured; skipping admin bootstrap");
                    return Ok(());
                }
            },
        };

        let admin = User {
            id: UserId::generate(),
            name: ADMIN_NAME.to_string(),
            email,
            hash: self.hasher.hash(&self.config.admin_password).await?,
            dept: ADMIN_PART.to_string(),
            part: MemberPart::Preset(ADMIN_PART.to_string()),
            created_at: Utc::now(),
            role: Role::Admin,
            approved: true,
        };
        let mut users = self.load_users().await?;
        users.push(admin);
        let changes = Changes::default().users(users);
        self.commit(&mut state, changes, None, LogAction::BootstrapAdmin, json!({ "name": ADMIN_NAME }))
            .await?;
        info!("Created admin account");
        Ok(())
    }

    // ========================================================================
    // Shared mutation plumbing
    // ========================================================================

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Mirror> {
        self.state.lock().await
    }

    /// Write `changes` and one audit entry for them in a single store
    /// commit, then update the mirror.
    pub(crate) async fn commit(
        &self,
        state: &mut Mirror,
        changes: Changes,
        actor: Option<&Actor>,
        action: LogAction,
        meta: Value,
    ) -> Result<()> {
        self.commit_all(state, changes, actor, vec![(action, meta)]).await
    }

    /// Like [`Club::commit`] with several audit entries, appended in order.
    ///
    /// Stored elements this version cannot decode are written back after
    /// the decoded ones.
    pub(crate) async fn commit_all(
        &self,
        state: &mut Mirror,
        changes: Changes,
        actor: Option<&Actor>,
        entries: Vec<(LogAction, Value)>,
    ) -> Result<()> {
        let name = actor.map_or(SYSTEM_ACTOR, |a| a.name.as_str());
        let mut logs = self.load_logs().await?;
        let mut tags = Vec::with_capacity(entries.len());
        for (action, meta) in entries {
            tags.push(action.to_string());
            append_bounded(&mut logs, LogEntry::new(name, action, meta));
        }

        let mut writes = changes.encode()?;
        writes.push((Collection::Logs, serde_json::to_value(&logs)?));
        for (collection, value) in &mut writes {
            if let Value::Array(items) = value {
                items.extend(self.unreadable_elements(*collection).await?);
            }
        }
        self.store.save_batch(writes).await?;

        changes.apply(state);
        state.logs = logs;
        for action in tags {
            info!(%action, actor = name, "Audit");
        }
        Ok(())
    }

    /// Stored elements of `collection` that do not decode
    async fn unreadable_elements(&self, collection: Collection) -> Result<Vec<Value>> {
        let stored = self.store.load_raw(collection).await?;
        let kept = undecodable(stored, |item| match collection {
            Collection::Songs => is_song(item),
            Collection::Users => User::deserialize(item).is_ok(),
            Collection::Signups => Signup::deserialize(item).is_ok(),
            Collection::Posts => Post::deserialize(item).is_ok(),
            Collection::Logs => LogEntry::deserialize(item).is_ok(),
            Collection::Session => true,
        });
        if !kept.is_empty() {
            warn!(%collection, count = kept.len(), "Keeping undecodable stored elements");
        }
        Ok(kept)
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Resolve the current identity for `id`, reading the role live.
    pub async fn actor(&self, id: &UserId) -> Result<Actor> {
        let state = self.state.lock().await;
        let user = state
            .users
            .iter()
            .find(|u| &u.id == id)
            .ok_or(AuthFailure::NotSignedIn)?;
        if !user.approved {
            return Err(AuthFailure::PendingApproval.into());
        }
        Ok(Actor::from(user))
    }

    pub async fn user(&self, id: &UserId) -> Result<User> {
        let state = self.state.lock().await;
        state
            .users
            .iter()
            .find(|u| &u.id == id)
            .cloned()
            .ok_or_else(|| ensemble_core::ClubError::not_found("User", id.as_str()))
    }
}
