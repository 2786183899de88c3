//! Shared fixtures for club integration tests
//!
//! Clubs run over REAL SQLite files in a temp dir so both store flavors
//! behave as in production.

#![allow(dead_code)]

use async_trait::async_trait;
use ensemble_club::{Club, ClubConfig, PasswordHasher, Registration};
use ensemble_core::{Actor, Backend, Collection, CollectionStore, MemberPart, Result};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

pub const ADMIN_PASSWORD: &str = "admin-secret";
pub const ADMIN_EMAIL: &str = "admin@club.test";

/// Reversible stand-in for bcrypt so tests stay fast
pub struct PlainHasher;

#[async_trait]
impl PasswordHasher for PlainHasher {
    async fn hash(&self, password: &str) -> Result<String> {
        Ok(format!("plain:{}", password))
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        Ok(hash == format!("plain:{}", password))
    }
}

/// Store over a temp database that is removed on drop
pub struct TestStore {
    pub store: Arc<dyn CollectionStore>,
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestStore {
    pub async fn new(backend: Backend) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}", temp_dir.path().join("club.db").display());
        let pool = ensemble_storage::create_pool(&db_url)
            .await
            .expect("Failed to create pool");
        ensemble_storage::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        Self {
            store: ensemble_storage::store_for(backend, pool.clone()),
            pool,
            _temp_dir: temp_dir,
        }
    }

    /// Make every write of the audit log fail until `allow_log_writes`
    pub async fn reject_log_writes(&self) {
        for event in ["INSERT", "UPDATE"] {
            sqlx::query(&format!(
                "CREATE TRIGGER reject_logs_{event} BEFORE {event} ON collections
                 WHEN NEW.name = 'admin_logs_v1'
                 BEGIN SELECT RAISE(ABORT, 'logs unavailable'); END"
            ))
            .execute(&self.pool)
            .await
            .expect("create trigger");
        }
    }

    pub async fn allow_log_writes(&self) {
        for event in ["INSERT", "UPDATE"] {
            sqlx::query(&format!("DROP TRIGGER reject_logs_{event}"))
                .execute(&self.pool)
                .await
                .expect("drop trigger");
        }
    }

    /// Raw stored list for `collection`
    pub async fn raw_list(&self, collection: Collection) -> Vec<Value> {
        match self.store.load_raw(collection).await.expect("load raw") {
            Some(Value::Array(items)) => items,
            other => panic!("{} is not a stored list: {:?}", collection, other),
        }
    }

    pub async fn open(&self, config: ClubConfig) -> Arc<Club> {
        let club = Club::open(self.store.clone(), config, Arc::new(PlainHasher))
            .await
            .expect("Failed to open club");
        Arc::new(club)
    }
}

pub async fn local_club() -> (TestStore, Arc<Club>) {
    let store = TestStore::new(Backend::Local).await;
    let club = store.open(ClubConfig::local(ADMIN_PASSWORD)).await;
    (store, club)
}

pub async fn cloud_club() -> (TestStore, Arc<Club>) {
    let store = TestStore::new(Backend::Cloud).await;
    let club = store.open(ClubConfig::cloud(ADMIN_PASSWORD, ADMIN_EMAIL)).await;
    (store, club)
}

pub async fn admin(club: &Club) -> Actor {
    let login = match club.mode() {
        Backend::Local => "admin",
        Backend::Cloud => ADMIN_EMAIL,
    };
    club.authenticate(login, ADMIN_PASSWORD)
        .await
        .expect("admin login")
}

pub fn registration(name: &str, password: &str) -> Registration {
    Registration {
        name: name.to_string(),
        email: None,
        password: password.to_string(),
        confirm: password.to_string(),
        dept: "컴공".to_string(),
        part: MemberPart::Preset("드럼".to_string()),
    }
}

/// Register `name` and approve it, returning the signed-in member
pub async fn member(club: &Club, name: &str) -> Actor {
    let admin = admin(club).await;
    let mut form = registration(name, "pw");
    if club.mode() == Backend::Cloud {
        form.email = Some(format!("{}@club.test", name));
    }
    let outcome = club.register(form).await.expect("register");
    let id = match outcome {
        ensemble_club::RegistrationOutcome::Pending { id } => id,
        ensemble_club::RegistrationOutcome::Approved { id } => id,
    };
    if club.mode() == Backend::Local {
        let signups = club.pending_signups(&admin).await.expect("signups");
        let signup = signups.iter().find(|s| s.name == name).expect("pending signup");
        club.approve_signup(&admin, &signup.id).await.expect("approve");
    } else {
        club.approve_signup(&admin, &id).await.expect("approve");
    }
    let login = match club.mode() {
        Backend::Local => name.to_string(),
        Backend::Cloud => format!("{}@club.test", name),
    };
    club.authenticate(&login, "pw").await.expect("member login")
}
