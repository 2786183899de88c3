mod ids;
mod log;
mod post;
mod song;
mod user;

pub use ids::{CommentId, LogId, PostId, SongId, UserId};
pub use log::{
    append_bounded, ExportedLog, LogAction, LogEntry, LOG_CAPACITY, LOG_VIEW_LIMIT, SYSTEM_ACTOR,
};
pub use post::{Comment, Post, PostDraft};
pub use song::{
    default_parts, is_builtin_key, player_tokens, DefaultPart, PartAssignment, Song, SongDraft,
    ValidSong, DEFAULT_PARTS,
};
pub use user::{
    MemberPart, PartFields, Role, Session, Signup, User, ADMIN_NAME, ADMIN_PART, CUSTOM_PART,
};
