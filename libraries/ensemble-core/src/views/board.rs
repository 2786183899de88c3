//! Board listing and comment threads

use crate::policy::{Action, Actor, Policy};
use crate::types::{Comment, Post};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRow<'a> {
    pub number: usize,
    #[serde(flatten)]
    pub post: &'a Post,
    pub comment_count: usize,
    /// Whether the viewer may edit or delete this post
    pub can_edit: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRow<'a> {
    #[serde(flatten)]
    pub comment: &'a Comment,
    pub can_edit: bool,
}

/// Posts newest first, each with the viewer's edit permission.
pub fn render_board<'a>(
    posts: &'a [Post],
    viewer: Option<&Actor>,
    policy: &Policy,
) -> Vec<BoardRow<'a>> {
    let mut sorted: Vec<&Post> = posts.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
        .into_iter()
        .enumerate()
        .map(|(idx, post)| BoardRow {
            number: idx + 1,
            post,
            comment_count: post.comments.len(),
            can_edit: policy.allows(viewer, Action::ModifyPost { author: &post.author }),
        })
        .collect()
}

/// A post's comments oldest first.
pub fn render_comments<'a>(
    post: &'a Post,
    viewer: Option<&Actor>,
    policy: &Policy,
) -> Vec<CommentRow<'a>> {
    let mut sorted: Vec<&Comment> = post.comments.iter().collect();
    sorted.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    sorted
        .into_iter()
        .map(|comment| CommentRow {
            comment,
            can_edit: policy.allows(viewer, Action::ModifyComment {
                author: &comment.author,
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommentId, PostId, Role, UserId};
    use chrono::{Duration, Utc};

    fn post(title: &str, author: &str, age_minutes: i64) -> Post {
        let ts = Utc::now() - Duration::minutes(age_minutes);
        Post {
            id: PostId::generate(),
            title: title.into(),
            body: "body".into(),
            author: author.into(),
            created_at: ts,
            updated_at: ts,
            comments: Vec::new(),
        }
    }

    fn member(name: &str) -> Actor {
        Actor {
            id: UserId::new(name),
            name: name.into(),
            role: Role::Member,
        }
    }

    #[test]
    fn newest_first_with_author_permission() {
        let posts = vec![post("old", "민수", 30), post("new", "철수", 1)];
        let viewer = member("민수");
        let rows = render_board(&posts, Some(&viewer), &Policy::default());
        assert_eq!(rows[0].post.title, "new");
        assert!(!rows[0].can_edit);
        assert!(rows[1].can_edit);
        assert_eq!(rows[1].number, 2);
    }

    #[test]
    fn comments_oldest_first() {
        let mut p = post("p", "민수", 10);
        let now = Utc::now();
        for (i, author) in ["b", "a"].iter().enumerate() {
            p.comments.push(Comment {
                id: CommentId::generate(),
                body: (*author).to_string(),
                author: (*author).to_string(),
                created_at: now - Duration::minutes(i as i64),
            });
        }
        let rows = render_comments(&p, None, &Policy::default());
        assert_eq!(rows[0].comment.body, "a");
        assert!(rows.iter().all(|r| !r.can_edit));
    }
}
