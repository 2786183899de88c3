//! Discussion board: posts and their comment threads

use crate::club::{Changes, Club};
use ensemble_core::{
    Action, Actor, ClubError, Comment, CommentId, LogAction, Post, PostDraft, PostId,
    Result,
};
use chrono::Utc;
use serde_json::json;

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ClubError::validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn find_post<'a>(posts: &'a mut [Post], id: &PostId) -> Result<&'a mut Post> {
    posts
        .iter_mut()
        .find(|p| &p.id == id)
        .ok_or_else(|| ClubError::not_found("Post", id.as_str()))
}

impl Club {
    pub async fn posts(&self) -> Vec<Post> {
        self.state.lock().await.posts.clone()
    }

    pub async fn post(&self, id: &PostId) -> Result<Post> {
        self.state
            .lock()
            .await
            .posts
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| ClubError::not_found("Post", id.as_str()))
    }

    pub async fn create_post(&self, actor: &Actor, draft: PostDraft) -> Result<Post> {
        self.policy.authorize(Some(actor), Action::Write)?;
        let title = required("title", &draft.title)?;
        let body = required("body", &draft.body)?;
        let now = Utc::now();
        let post = Post {
            id: PostId::generate(),
            title,
            body,
            author: actor.name.clone(),
            created_at: now,
            updated_at: now,
            comments: Vec::new(),
        };

        let mut state = self.lock().await;
        let mut posts = self.load_posts().await?;
        posts.push(post.clone());

        let meta = json!({ "title": post.title });
        let changes = Changes::default().posts(posts);
        self.commit(&mut state, changes, Some(actor), LogAction::PostAdded, meta).await?;
        Ok(post)
    }

    pub async fn update_post(&self, actor: &Actor, id: &PostId, draft: PostDraft) -> Result<Post> {
        let title = required("title", &draft.title)?;
        let body = required("body", &draft.body)?;

        let mut state = self.lock().await;
        let mut posts = self.load_posts().await?;
        let post = find_post(&mut posts, id)?;
        self.policy.authorize(Some(actor), Action::ModifyPost { author: &post.author })?;
        post.title = title;
        post.body = body;
        post.updated_at = Utc::now();
        let post = post.clone();

        let meta = json!({ "id": post.id, "title": post.title });
        let changes = Changes::default().posts(posts);
        self.commit(&mut state, changes, Some(actor), LogAction::PostEdited, meta).await?;
        Ok(post)
    }

    /// Delete a post together with its whole comment thread.
    pub async fn delete_post(&self, actor: &Actor, id: &PostId) -> Result<()> {
        let mut state = self.lock().await;
        let mut posts = self.load_posts().await?;
        let idx = posts
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| ClubError::not_found("Post", id.as_str()))?;
        self.policy.authorize(Some(actor), Action::ModifyPost { author: &posts[idx].author })?;
        let removed = posts.remove(idx);

        let meta = json!({ "title": removed.title, "author": removed.author });
        let changes = Changes::default().posts(posts);
        self.commit(&mut state, changes, Some(actor), LogAction::PostDeleted, meta).await
    }

    pub async fn add_comment(&self, actor: &Actor, post_id: &PostId, body: &str) -> Result<Comment> {
        self.policy.authorize(Some(actor), Action::Write)?;
        let body = required("comment", body)?;

        let mut state = self.lock().await;
        let mut posts = self.load_posts().await?;
        let post = find_post(&mut posts, post_id)?;
        let comment = Comment {
            id: CommentId::generate(),
            body,
            author: actor.name.clone(),
            created_at: Utc::now(),
        };
        post.comments.push(comment.clone());
        let title = post.title.clone();

        let meta = json!({ "postTitle": title });
        let changes = Changes::default().posts(posts);
        self.commit(&mut state, changes, Some(actor), LogAction::CommentAdded, meta).await?;
        Ok(comment)
    }

    pub async fn edit_comment(
        &self,
        actor: &Actor,
        post_id: &PostId,
        comment_id: &CommentId,
        body: &str,
    ) -> Result<Comment> {
        let body = required("comment", body)?;

        let mut state = self.lock().await;
        let mut posts = self.load_posts().await?;
        let post = find_post(&mut posts, post_id)?;
        let title = post.title.clone();
        let comment = post
            .comments
            .iter_mut()
            .find(|c| &c.id == comment_id)
            .ok_or_else(|| ClubError::not_found("Comment", comment_id.as_str()))?;
        self.policy.authorize(Some(actor), Action::ModifyComment { author: &comment.author })?;
        comment.body = body;
        let comment = comment.clone();

        let meta = json!({ "postTitle": title });
        let changes = Changes::default().posts(posts);
        self.commit(&mut state, changes, Some(actor), LogAction::CommentEdited, meta).await?;
        Ok(comment)
    }

    pub async fn delete_comment(
        &self,
        actor: &Actor,
        post_id: &PostId,
        comment_id: &CommentId,
    ) -> Result<()> {
        let mut state = self.lock().await;
        let mut posts = self.load_posts().await?;
        let post = find_post(&mut posts, post_id)?;
        let idx = post
            .comments
            .iter()
            .position(|c| &c.id == comment_id)
            .ok_or_else(|| ClubError::not_found("Comment", comment_id.as_str()))?;
        self.policy.authorize(
            Some(actor),
            Action::ModifyComment { author: &post.comments[idx].author },
        )?;
        let removed = post.comments.remove(idx);
        let title = post.title.clone();

        let meta = json!({ "postTitle": title, "commentAuthor": removed.author });
        let changes = Changes::default().posts(posts);
        self.commit(&mut state, changes, Some(actor), LogAction::CommentDeleted, meta).await
    }
}
