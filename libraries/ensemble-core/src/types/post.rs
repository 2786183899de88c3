//! Board post and comment types
use super::ids::{CommentId, PostId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment attached to a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub body: String,
    pub author: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Discussion board post with its comment thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub author: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    /// Older posts were stored without a thread
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn comment(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| &c.id == id)
    }
}

/// Title and body as submitted by an editor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_without_comments_decodes_with_empty_thread() {
        let raw = json!({
            "id": "p1",
            "title": "공연 공지",
            "body": "토요일 7시",
            "author": "admin",
            "createdAt": 1_700_000_000_000_i64,
            "updatedAt": 1_700_000_000_000_i64
        });
        let post: Post = serde_json::from_value(raw).unwrap();
        assert!(post.comments.is_empty());
        assert_eq!(post.created_at.timestamp_millis(), 1_700_000_000_000);
    }
}
