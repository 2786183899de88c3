//! Ensemble Storage
//!
//! `SQLite` backends for the club's collections.
//!
//! # Architecture
//!
//! - **Local**: [`LocalStore`] keeps each collection as one JSON value under
//!   its key. No push channel.
//! - **Cloud**: [`DocumentStore`] keeps one document per element, with post
//!   comments in a sub-collection, and pushes full snapshots to subscribers
//!   after every commit.
//!
//! # Example
//!
//! ```rust,no_run
//! use ensemble_core::{Backend, Collection};
//! use ensemble_storage::open_store;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = open_store(Backend::Local, "sqlite://ensemble.db").await?;
//! let songs: Vec<serde_json::Value> = store.load_list(Collection::Songs).await?;
//! # Ok(())
//! # }
//! ```

mod cloud;
mod error;
mod local;

pub use cloud::DocumentStore;
pub use error::{Result, StorageError};
pub use local::LocalStore;

use ensemble_core::{Backend, CollectionStore};
use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at startup, before any store is used.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `sqlite://ensemble.db`)
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    debug!(database_url, "Creating pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!(database_url, "Database pool ready");
    Ok(pool)
}

/// Store for `backend` over an already migrated pool
pub fn store_for(backend: Backend, pool: SqlitePool) -> Arc<dyn CollectionStore> {
    match backend {
        Backend::Local => Arc::new(LocalStore::new(pool)),
        Backend::Cloud => Arc::new(DocumentStore::new(pool)),
    }
}

/// Connect, migrate and build the store for `backend`.
pub async fn open_store(backend: Backend, database_url: &str) -> Result<Arc<dyn CollectionStore>> {
    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;
    Ok(store_for(backend, pool))
}
