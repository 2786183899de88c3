//! Key/value collection store
//!
//! Each collection is one JSON document under its local key. There is no
//! push channel: callers re-render after their own writes.

use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use ensemble_core::{Backend, Collection, CollectionStore};
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

/// SQLite-backed key/value store
#[derive(Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn read(&self, collection: Collection) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT value FROM collections WHERE name = ?")
            .bind(collection.local_key())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let text: String = row.get("value");
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(%collection, error = %e, "Stored collection is not valid JSON");
                Ok(None)
            }
        }
    }

    /// Upsert every collection in one transaction
    async fn write(&self, writes: &[(Collection, Value)]) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;
        for (collection, value) in writes {
            sqlx::query(
                "INSERT INTO collections (name, value, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(collection.local_key())
            .bind(serde_json::to_string(value)?)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        for (collection, _) in writes {
            debug!(%collection, "Saved collection");
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection) -> Result<()> {
        sqlx::query("DELETE FROM collections WHERE name = ?")
            .bind(collection.local_key())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for LocalStore {
    fn backend(&self) -> Backend {
        Backend::Local
    }

    async fn load_raw(&self, collection: Collection) -> ensemble_core::Result<Option<Value>> {
        Ok(self.read(collection).await?)
    }

    async fn save_raw(&self, collection: Collection, value: Value) -> ensemble_core::Result<()> {
        Ok(self.write(&[(collection, value)]).await?)
    }

    async fn save_batch(&self, writes: Vec<(Collection, Value)>) -> ensemble_core::Result<()> {
        Ok(self.write(&writes).await?)
    }

    async fn remove(&self, collection: Collection) -> ensemble_core::Result<()> {
        Ok(self.delete(collection).await?)
    }
}
