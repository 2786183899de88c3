//! Live views and snapshot sync for push-capable stores
//!
//! A [`LiveView`] turns a store [`Subscription`] into decoded domain lists.
//! A view can be tied to a session generation; it stops, and releases its
//! listener, as soon as that session ends.
//!
//! [`Club::spawn_sync`] keeps the club's own mirrors current by replacing
//! them with every snapshot the store pushes.

use crate::club::Club;
use ensemble_core::normalize::normalize_all;
use ensemble_core::store::decode_list;
use ensemble_core::{Collection, Post, Result, Snapshot, Song, Subscription, User};
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Decoded stream of snapshots for one collection
pub struct LiveView<T> {
    subscription: Option<Subscription>,
    decode: fn(Snapshot) -> Vec<T>,
    session: Option<watch::Receiver<u64>>,
}

impl<T> LiveView<T> {
    pub fn new(subscription: Subscription, decode: fn(Snapshot) -> Vec<T>) -> Self {
        Self {
            subscription: Some(subscription),
            decode,
            session: None,
        }
    }

    /// Stop the view when the session generation moves on.
    pub fn bound_to(mut self, session: watch::Receiver<u64>) -> Self {
        self.session = Some(session);
        self
    }

    /// Whether the view still has a live subscription
    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Next decoded snapshot, or `None` once the view has stopped.
    pub async fn next(&mut self) -> Option<Vec<T>> {
        let decode = self.decode;
        let subscription = self.subscription.as_mut()?;

        let snapshot = match self.session.as_mut() {
            None => subscription.next().await,
            Some(session) => {
                if session.has_changed().unwrap_or(true) {
                    None
                } else {
                    tokio::select! {
                        snapshot = subscription.next() => snapshot,
                        _ = session.changed() => None,
                    }
                }
            }
        };

        match snapshot {
            Some(snapshot) => Some(decode(snapshot)),
            None => {
                self.stop();
                None
            }
        }
    }

    /// Release the subscription now
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            debug!(collection = %subscription.collection(), "Live view stopped");
            subscription.cancel();
        }
    }
}

fn decode_posts(snapshot: Snapshot) -> Vec<Post> {
    decode_list(Collection::Posts, Value::Array(snapshot))
}

/// Background tasks feeding pushed snapshots into a club.
///
/// Dropping the handle aborts the tasks and releases their subscriptions.
#[derive(Debug)]
pub struct SyncHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl SyncHandle {
    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|t| !t.is_finished())
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Collections the club mirrors
const SYNCED: [Collection; 5] = [
    Collection::Songs,
    Collection::Users,
    Collection::Signups,
    Collection::Posts,
    Collection::Logs,
];

impl Club {
    /// Live playlist, normalized on every snapshot
    pub async fn watch_songs(&self) -> Result<LiveView<Song>> {
        let subscription = self.store.subscribe(Collection::Songs, None).await?;
        Ok(LiveView::new(subscription, normalize_all))
    }

    /// Live board
    pub async fn watch_posts(&self) -> Result<LiveView<Post>> {
        let subscription = self.store.subscribe(Collection::Posts, None).await?;
        Ok(LiveView::new(subscription, decode_posts))
    }

    /// Replace one mirror with a pushed snapshot.
    pub async fn apply_snapshot(&self, collection: Collection, snapshot: Snapshot) {
        let mut state = self.state.lock().await;
        match collection {
            Collection::Songs => state.songs = normalize_all(snapshot),
            Collection::Users => {
                let mut users: Vec<User> = decode_list(collection, Value::Array(snapshot));
                for user in &mut users {
                    self.migrate_role(user);
                }
                state.users = users;
            }
            Collection::Signups => state.signups = decode_list(collection, Value::Array(snapshot)),
            Collection::Posts => state.posts = decode_posts(snapshot),
            Collection::Logs => state.logs = decode_list(collection, Value::Array(snapshot)),
            Collection::Session => return,
        }
        debug!(%collection, "Mirror replaced from snapshot");
    }

    /// Subscribe to every mirrored collection and apply what arrives.
    ///
    /// Fails with `Unsupported` on stores without a push channel.
    pub async fn spawn_sync(self: &Arc<Self>) -> Result<SyncHandle> {
        let mut handle = SyncHandle {
            tasks: Vec::with_capacity(SYNCED.len()),
        };
        for collection in SYNCED {
            let mut subscription = self.store.subscribe(collection, None).await?;
            let club: Weak<Club> = Arc::downgrade(self);
            handle.tasks.push(tokio::spawn(async move {
                while let Some(snapshot) = subscription.next().await {
                    let Some(club) = club.upgrade() else { break };
                    club.apply_snapshot(collection, snapshot).await;
                }
                debug!(%collection, "Sync task finished");
            }));
        }
        info!(collections = handle.tasks.len(), "Snapshot sync started");
        Ok(handle)
    }
}
