//! Ensemble Core
//!
//! Backend-agnostic domain types, rules and views for the Ensemble club app.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Song`, `PartAssignment`, `User`, `Signup`, `Post`, `LogEntry`
//! - **Normalizer**: migration of stored song shapes into the canonical part list
//! - **Policy**: one authorization function used by every privileged operation
//! - **Persistence contract**: the `CollectionStore` trait and `Subscription` handle
//! - **Views**: pure projections for the playlist, by-person lookup, board and admin tables
//! - **Error Handling**: unified `ClubError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use ensemble_core::types::{SongDraft, SongId};
//! use ensemble_core::views::playlist::{render_playlist, PlaylistQuery};
//!
//! let song = SongDraft {
//!     title: "Song A".into(),
//!     artist: "Band X".into(),
//!     ..Default::default()
//! }
//! .validate()
//! .unwrap()
//! .into_song(SongId::generate());
//!
//! let songs = vec![song];
//! let rows = render_playlist(&songs, &PlaylistQuery::default());
//! assert_eq!(rows[0].number, 1);
//! ```

#![forbid(unsafe_code)]

pub mod collate;
pub mod editor;
pub mod error;
pub mod normalize;
pub mod policy;
pub mod slug;
pub mod store;
pub mod types;
pub mod views;

// Re-export commonly used types
pub use editor::{PartField, PartsEditor};
pub use error::{AuthFailure, ClubError, Result};
pub use policy::{Action, Actor, Policy, SongEditing, Tab};
pub use store::{Backend, Collection, CollectionStore, Snapshot, SnapshotFilter, Subscription};

pub use types::{
    // Playlist
    PartAssignment, Song, SongDraft, SongId,
    // Accounts
    MemberPart, Role, Session, Signup, User, UserId,
    // Board
    Comment, CommentId, Post, PostDraft, PostId,
    // Audit log
    LogAction, LogEntry, LogId,
};
