//! Session/auth gate for a single signed-in client
//!
//! Tracks Anonymous → Authenticated → Anonymous. The signed-in identity is
//! persisted in the `session` collection so it survives a restart, and is
//! re-resolved against the current accounts on every
//! [`SessionGate::revalidate`]. Ending a session bumps a generation counter
//! that stops every [`LiveView`] opened under it.

use crate::club::Club;
use crate::live::LiveView;
use ensemble_core::{
    Actor, AuthFailure, ClubError, Collection, Post, Result, Session, Song, Tab, User,
};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

/// Who is using the client right now
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(Actor),
}

impl SessionState {
    pub fn actor(&self) -> Option<&Actor> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated(actor) => Some(actor),
        }
    }
}

pub struct SessionGate {
    club: Arc<Club>,
    state: RwLock<SessionState>,
    generation: watch::Sender<u64>,
}

impl SessionGate {
    pub fn new(club: Arc<Club>) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            club,
            state: RwLock::new(SessionState::Anonymous),
            generation,
        }
    }

    pub fn club(&self) -> &Arc<Club> {
        &self.club
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn actor(&self) -> Option<Actor> {
        self.state.read().await.actor().cloned()
    }

    /// The signed-in identity, or `NotSignedIn`
    pub async fn require(&self) -> Result<Actor> {
        self.actor().await.ok_or_else(|| AuthFailure::NotSignedIn.into())
    }

    pub async fn visible_tabs(&self) -> Vec<Tab> {
        let state = self.state.read().await;
        self.club.policy().visible_tabs(state.actor())
    }

    /// Current session generation; changes whenever a session ends
    pub fn generation(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// Pick up the identity persisted by an earlier run.
    ///
    /// A stored identity that no longer resolves to an approved account is
    /// discarded.
    pub async fn restore(&self) -> Result<Option<Actor>> {
        let stored: Option<Session> = self
            .club
            .store()
            .load_or(Collection::Session, None)
            .await?;
        let Some(session) = stored else {
            return Ok(None);
        };

        match self.resolve(&session).await {
            Ok(actor) => {
                self.persist(&actor).await?;
                *self.state.write().await = SessionState::Authenticated(actor.clone());
                info!(name = %actor.name, "Session restored");
                Ok(Some(actor))
            }
            Err(ClubError::Auth(failure)) => {
                warn!(name = %session.name, reason = failure.code(), "Discarding stored session");
                self.club.store().remove(Collection::Session).await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn resolve(&self, session: &Session) -> Result<Actor> {
        if let Some(id) = &session.user_id {
            return self.club.actor(id).await;
        }
        // Sessions written before ids were stored carry only the name
        let users: Vec<User> = self.club.state.lock().await.users.clone();
        let user = users
            .iter()
            .find(|u| u.name == session.name)
            .ok_or(AuthFailure::NotSignedIn)?;
        self.club.actor(&user.id).await
    }

    /// Check the credential and start a session.
    pub async fn login(&self, login: &str, password: &str) -> Result<Actor> {
        let actor = self.club.authenticate(login, password).await?;
        let mut state = self.state.write().await;
        if state.actor().is_some() {
            self.end_generation();
        }
        self.persist(&actor).await?;
        *state = SessionState::Authenticated(actor.clone());
        info!(name = %actor.name, "Signed in");
        Ok(actor)
    }

    /// End the session and stop every view opened under it.
    pub async fn logout(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(actor) = state.actor() {
            info!(name = %actor.name, "Signed out");
        }
        *state = SessionState::Anonymous;
        self.end_generation();
        self.club.store().remove(Collection::Session).await
    }

    /// Re-read the signed-in account.
    ///
    /// A deleted or unapproved account forces a sign-out; a renamed one
    /// carries the session over to the new name.
    pub async fn revalidate(&self) -> Result<SessionState> {
        let Some(current) = self.actor().await else {
            return Ok(SessionState::Anonymous);
        };
        match self.club.actor(&current.id).await {
            Ok(fresh) => {
                if fresh != current {
                    debug!(old = %current.name, new = %fresh.name, "Session identity changed");
                    self.persist(&fresh).await?;
                    *self.state.write().await = SessionState::Authenticated(fresh.clone());
                }
                Ok(SessionState::Authenticated(fresh))
            }
            Err(ClubError::Auth(failure)) => {
                warn!(name = %current.name, reason = failure.code(), "Forcing sign-out");
                self.logout().await?;
                Ok(SessionState::Anonymous)
            }
            Err(e) => Err(e),
        }
    }

    /// Live playlist for the signed-in member
    pub async fn watch_songs(&self) -> Result<LiveView<Song>> {
        self.require().await?;
        Ok(self.club.watch_songs().await?.bound_to(self.generation()))
    }

    /// Live board for the signed-in member
    pub async fn watch_posts(&self) -> Result<LiveView<Post>> {
        self.require().await?;
        Ok(self.club.watch_posts().await?.bound_to(self.generation()))
    }

    async fn persist(&self, actor: &Actor) -> Result<()> {
        let session = Session {
            name: actor.name.clone(),
            user_id: Some(actor.id.clone()),
        };
        self.club.store().save(Collection::Session, &Some(session)).await
    }

    fn end_generation(&self) {
        self.generation.send_modify(|g| *g += 1);
    }
}
