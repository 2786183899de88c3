//! Document collection store with live subscriptions
//!
//! Every list element is its own document. Post comments live in a separate
//! `comments` collection keyed by the parent post and are folded back into
//! their post on read. A value that is not a list is kept as a single
//! document.
//!
//! Every committed write pushes the full, re-read contents of the
//! collection to each subscriber of that collection.

use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use ensemble_core::store::{Snapshot, SnapshotFilter, Subscription};
use ensemble_core::{Backend, Collection, CollectionStore};
use serde_json::Value;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const COMMENTS: &str = "comments";

/// Document id of a collection stored as a single value
const SINGLE_DOC: &str = "_";

/// Position marking a single-value document
const SINGLE_POSITION: i64 = -1;

struct Listener {
    tx: mpsc::UnboundedSender<Snapshot>,
    filter: Option<SnapshotFilter>,
}

impl Listener {
    fn deliver(&self, snapshot: &[Value]) -> bool {
        let filtered: Snapshot = match &self.filter {
            Some(filter) => snapshot.iter().filter(|v| filter(v)).cloned().collect(),
            None => snapshot.to_vec(),
        };
        self.tx.send(filtered).is_ok()
    }
}

type Listeners = Arc<Mutex<HashMap<Collection, HashMap<u64, Listener>>>>;

/// SQLite-backed document store
#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
    listeners: Listeners,
    next_listener: Arc<AtomicU64>,
    /// Serializes commit+notify against subscribe's first read
    commit: Arc<tokio::sync::Mutex<()>>,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener: Arc::new(AtomicU64::new(1)),
            commit: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of live subscriptions on `collection`
    pub fn listener_count(&self, collection: Collection) -> usize {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.get(&collection).map_or(0, HashMap::len)
    }

    async fn read_docs(&self, collection: &str, parent_id: &str) -> Result<Vec<(i64, Value)>> {
        let rows = sqlx::query(
            "SELECT position, body FROM documents
             WHERE collection = ? AND parent_id = ?
             ORDER BY position",
        )
        .bind(collection)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let position: i64 = row.get("position");
            let body: String = row.get("body");
            match serde_json::from_str(&body) {
                Ok(value) => docs.push((position, value)),
                Err(e) => warn!(collection, error = %e, "Skipping unreadable document"),
            }
        }
        Ok(docs)
    }

    async fn read(&self, collection: Collection) -> Result<Option<Value>> {
        let docs = self.read_docs(collection.document_name(), "").await?;
        if docs.is_empty() {
            return Ok(None);
        }
        if let [(SINGLE_POSITION, value)] = docs.as_slice() {
            return Ok(Some(value.clone()));
        }

        let mut items = Vec::with_capacity(docs.len());
        for (_, mut doc) in docs {
            if collection == Collection::Posts {
                if let Some(post_id) = doc.get("id").and_then(Value::as_str).map(str::to_string) {
                    let comments = self.read_docs(COMMENTS, &post_id).await?;
                    if let Value::Object(map) = &mut doc {
                        map.insert(
                            COMMENTS.to_string(),
                            Value::Array(comments.into_iter().map(|(_, c)| c).collect()),
                        );
                    }
                }
            }
            items.push(doc);
        }
        Ok(Some(Value::Array(items)))
    }

    /// Replace every collection in one transaction
    async fn write(&self, writes: Vec<(Collection, Value)>) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;
        let mut written = Vec::with_capacity(writes.len());
        for (collection, value) in writes {
            replace(&mut tx, collection, value, now).await?;
            written.push(collection);
        }
        tx.commit().await?;
        for collection in written {
            debug!(%collection, "Committed documents");
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        clear(&mut tx, collection).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Push the committed contents of `collection` to its subscribers.
    async fn notify(&self, collection: Collection) -> Result<()> {
        if self.listener_count(collection) == 0 {
            return Ok(());
        }
        let snapshot = into_snapshot(self.read(collection).await?);
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(subscribers) = listeners.get_mut(&collection) {
            subscribers.retain(|_, listener| listener.deliver(&snapshot));
        }
        Ok(())
    }

    fn register(&self, collection: Collection, listener: Listener) -> u64 {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.entry(collection).or_default().insert(id, listener);
        id
    }
}

fn into_snapshot(value: Option<Value>) -> Snapshot {
    match value {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single],
    }
}

/// The element's own `id` when it has a usable one, else its position.
fn document_id(item: &Value, position: usize, used: &HashSet<String>) -> String {
    match item.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() && !used.contains(id) => id.to_string(),
        _ => format!("#{}", position),
    }
}

fn take_comments(post: &mut Value) -> Vec<Value> {
    let Value::Object(map) = post else {
        return Vec::new();
    };
    match map.remove(COMMENTS) {
        Some(Value::Array(comments)) => comments,
        _ => Vec::new(),
    }
}

async fn replace(
    tx: &mut Transaction<'_, Sqlite>,
    collection: Collection,
    value: Value,
    now: i64,
) -> Result<()> {
    clear(tx, collection).await?;
    let name = collection.document_name();

    match value {
        Value::Array(items) => {
            let mut used = HashSet::new();
            for (position, mut item) in items.into_iter().enumerate() {
                let id = document_id(&item, position, &used);
                used.insert(id.clone());
                if collection == Collection::Posts {
                    let comments = take_comments(&mut item);
                    let mut comment_ids = HashSet::new();
                    for (idx, comment) in comments.into_iter().enumerate() {
                        let comment_id = document_id(&comment, idx, &comment_ids);
                        comment_ids.insert(comment_id.clone());
                        insert(tx, COMMENTS, &id, &comment_id, idx as i64, &comment, now).await?;
                    }
                }
                insert(tx, name, "", &id, position as i64, &item, now).await?;
            }
        }
        Value::Null => {}
        single => insert(tx, name, "", SINGLE_DOC, SINGLE_POSITION, &single, now).await?,
    }
    Ok(())
}

async fn clear(tx: &mut Transaction<'_, Sqlite>, collection: Collection) -> Result<()> {
    sqlx::query("DELETE FROM documents WHERE collection = ?")
        .bind(collection.document_name())
        .execute(&mut **tx)
        .await?;
    if collection == Collection::Posts {
        sqlx::query("DELETE FROM documents WHERE collection = ?")
            .bind(COMMENTS)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn insert(
    tx: &mut Transaction<'_, Sqlite>,
    collection: &str,
    parent_id: &str,
    id: &str,
    position: i64,
    body: &Value,
    now: i64,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO documents (collection, parent_id, id, position, body, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(collection)
    .bind(parent_id)
    .bind(id)
    .bind(position)
    .bind(serde_json::to_string(body)?)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl CollectionStore for DocumentStore {
    fn backend(&self) -> Backend {
        Backend::Cloud
    }

    async fn load_raw(&self, collection: Collection) -> ensemble_core::Result<Option<Value>> {
        Ok(self.read(collection).await?)
    }

    async fn save_raw(&self, collection: Collection, value: Value) -> ensemble_core::Result<()> {
        let _commit = self.commit.lock().await;
        self.write(vec![(collection, value)]).await?;
        Ok(self.notify(collection).await?)
    }

    async fn save_batch(&self, writes: Vec<(Collection, Value)>) -> ensemble_core::Result<()> {
        let collections: Vec<Collection> = writes.iter().map(|(c, _)| *c).collect();
        let _commit = self.commit.lock().await;
        self.write(writes).await?;
        for collection in collections {
            self.notify(collection).await?;
        }
        Ok(())
    }

    async fn remove(&self, collection: Collection) -> ensemble_core::Result<()> {
        let _commit = self.commit.lock().await;
        self.delete(collection).await?;
        Ok(self.notify(collection).await?)
    }

    async fn subscribe(
        &self,
        collection: Collection,
        filter: Option<SnapshotFilter>,
    ) -> ensemble_core::Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = Listener { tx, filter };

        // No commit can land between the first snapshot and registration
        let _commit = self.commit.lock().await;
        let current = into_snapshot(self.read(collection).await?);
        listener.deliver(&current);
        let id = self.register(collection, listener);
        info!(%collection, listener = id, "Subscribed");

        let listeners = Arc::clone(&self.listeners);
        Ok(Subscription::new(collection, rx, move || {
            let mut listeners = listeners.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(subscribers) = listeners.get_mut(&collection) {
                subscribers.remove(&id);
            }
            debug!(%collection, listener = id, "Subscription released");
        }))
    }
}
