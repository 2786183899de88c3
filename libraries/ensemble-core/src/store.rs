//! Persistence adapter contract
//!
//! A [`CollectionStore`] reads and writes the six named collections as
//! JSON. Backends with a push channel also hand out [`Subscription`]s that
//! deliver a full replacement snapshot on every change.

use crate::error::{ClubError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// The logical tables the club persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Songs,
    Users,
    Signups,
    Posts,
    Session,
    Logs,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Songs,
        Collection::Users,
        Collection::Signups,
        Collection::Posts,
        Collection::Session,
        Collection::Logs,
    ];

    /// Key used by the key/value backend
    pub fn local_key(self) -> &'static str {
        match self {
            Collection::Songs => "band_playlist_v1",
            Collection::Users => "users_v1",
            Collection::Signups => "signups_v1",
            Collection::Posts => "board_posts_v1",
            Collection::Session => "session_v1",
            Collection::Logs => "admin_logs_v1",
        }
    }

    /// Top-level collection name used by the document backend
    pub fn document_name(self) -> &'static str {
        match self {
            Collection::Songs => "songs",
            Collection::Users => "users",
            Collection::Signups => "signups",
            Collection::Posts => "posts",
            Collection::Session => "session",
            Collection::Logs => "logs",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.document_name())
    }
}

/// Which kind of backend a store is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Synchronous snapshots, no push channel
    Local,
    /// Document store with live subscriptions
    Cloud,
}

/// Full contents of a collection as a list of JSON elements
pub type Snapshot = Vec<Value>;

/// Element filter applied to snapshots before delivery
pub type SnapshotFilter = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Live feed of snapshots for one collection.
///
/// The listener is released when the handle is dropped or cancelled, so the
/// owner of a view ties the subscription to the view's lifetime.
pub struct Subscription {
    collection: Collection,
    rx: mpsc::UnboundedReceiver<Snapshot>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        collection: Collection,
        rx: mpsc::UnboundedReceiver<Snapshot>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            collection,
            rx,
            release: Some(Box::new(release)),
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Wait for the next snapshot. `None` once the store has gone away.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// Most recent snapshot already queued, skipping older ones
    pub fn latest(&mut self) -> Option<Snapshot> {
        let mut latest = None;
        while let Ok(snapshot) = self.rx.try_recv() {
            latest = Some(snapshot);
        }
        latest
    }

    /// Release the listener now
    pub fn cancel(mut self) {
        self.release_listener();
    }

    fn release_listener(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
        self.rx.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_listener();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("collection", &self.collection)
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Backing store for the club's collections
///
/// Writes are durable before `save_raw` returns. Loading a collection that
/// was never written yields `None`.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    fn backend(&self) -> Backend;

    /// Stored JSON for a collection, if any
    async fn load_raw(&self, collection: Collection) -> Result<Option<Value>>;

    /// Replace a collection's contents
    async fn save_raw(&self, collection: Collection, value: Value) -> Result<()>;

    /// Remove a collection entirely
    async fn remove(&self, collection: Collection) -> Result<()>;

    /// Replace several collections in one commit.
    ///
    /// Backends with transactions write all or nothing. The default writes
    /// in order and stops at the first failure.
    async fn save_batch(&self, writes: Vec<(Collection, Value)>) -> Result<()> {
        for (collection, value) in writes {
            self.save_raw(collection, value).await?;
        }
        Ok(())
    }

    /// Subscribe to snapshots of a collection.
    ///
    /// The current contents are delivered first, then one snapshot per
    /// committed change.
    async fn subscribe(
        &self,
        collection: Collection,
        filter: Option<SnapshotFilter>,
    ) -> Result<Subscription> {
        let _ = filter;
        Err(ClubError::Unsupported(format!(
            "live updates for {}",
            collection
        )))
    }
}

impl dyn CollectionStore {
    /// Load and decode a collection, falling back to `default` when it is
    /// missing or cannot be decoded.
    pub async fn load_or<T: DeserializeOwned + Send>(
        &self,
        collection: Collection,
        default: T,
    ) -> Result<T> {
        let Some(value) = self.load_raw(collection).await? else {
            return Ok(default);
        };
        match serde_json::from_value(value) {
            Ok(decoded) => Ok(decoded),
            Err(e) => {
                warn!(%collection, error = %e, "Stored collection is unreadable, using default");
                Ok(default)
            }
        }
    }

    /// Load a list collection, dropping elements that cannot be decoded.
    pub async fn load_list<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let Some(value) = self.load_raw(collection).await? else {
            return Ok(Vec::new());
        };
        Ok(decode_list(collection, value))
    }

    /// Encode and store a collection.
    pub async fn save<T: Serialize + Sync>(&self, collection: Collection, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.save_raw(collection, value).await
    }
}

/// Decode every element of a JSON list that matches `T`.
///
/// Elements that do not decode are left out of the result but not out of
/// the store: see [`undecodable`].
pub fn decode_list<T: DeserializeOwned>(collection: Collection, value: Value) -> Vec<T> {
    let Value::Array(items) = value else {
        warn!(%collection, "Stored collection is not a list, using empty list");
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(%collection, error = %e, "Skipping undecodable element");
                None
            }
        })
        .collect()
}

/// Stored list elements rejected by `decodes`, in stored order.
///
/// Writers append these to a collection they replace so records they cannot
/// read survive the write.
pub fn undecodable(stored: Option<Value>, decodes: impl Fn(&Value) -> bool) -> Vec<Value> {
    match stored {
        Some(Value::Array(items)) => items.into_iter().filter(|item| !decodes(item)).collect(),
        _ => Vec::new(),
    }
}
