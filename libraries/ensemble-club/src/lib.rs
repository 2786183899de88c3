//! Ensemble Club
//!
//! The club's application state: domain collections with their audit
//! trail, the session gate, and live views over push-capable stores.
//!
//! # Example
//!
//! ```rust,no_run
//! use ensemble_club::{Club, ClubConfig, PasswordHasher};
//! use ensemble_core::{Backend, SongDraft};
//! use std::sync::Arc;
//!
//! # async fn example(hasher: Arc<dyn PasswordHasher>) -> Result<(), Box<dyn std::error::Error>> {
//! let store = ensemble_storage::open_store(Backend::Local, "sqlite://ensemble.db").await?;
//! let club = Club::open(store, ClubConfig::local("changeme"), hasher).await?;
//!
//! let admin = club.authenticate("admin", "changeme").await?;
//! let draft = SongDraft {
//!     title: "Song A".into(),
//!     artist: "Band X".into(),
//!     ..Default::default()
//! };
//! club.create_song(&admin, draft).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod accounts;
mod board;
mod club;
mod config;
mod hasher;
mod live;
mod logs;
mod session;
mod songs;

pub use accounts::{NewUser, ProfileEdit, Registration, RegistrationOutcome, UserEdit};
pub use club::Club;
pub use config::ClubConfig;
pub use hasher::PasswordHasher;
pub use live::{LiveView, SyncHandle};
pub use session::{SessionGate, SessionState};
