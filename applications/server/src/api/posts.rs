//! Board API routes
use crate::{api::detached, error::Result, middleware::CurrentActor, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use ensemble_core::views::board::{render_board, render_comments};
use ensemble_core::{Action, ClubError, Comment, CommentId, Post, PostDraft, PostId};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub body: String,
}

/// GET /api/posts
/// Newest first, with the caller's edit permission per row
pub async fn list_posts(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Value>> {
    let posts = state.club.posts().await;
    let rows = render_board(&posts, Some(&actor), state.club.policy());
    Ok(Json(serde_json::to_value(rows).map_err(ClubError::from)?))
}

/// GET /api/posts/:id
/// The post with its comment thread, oldest comment first
pub async fn get_post(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let post = state.club.post(&PostId::new(id)).await?;
    let policy = state.club.policy();
    let comments = render_comments(&post, Some(&actor), policy);
    let can_edit = policy.allows(Some(&actor), Action::ModifyPost { author: &post.author });
    Ok(Json(json!({
        "post": post,
        "comments": comments,
        "canEdit": can_edit,
    })))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(draft): Json<PostDraft>,
) -> Result<(StatusCode, Json<Post>)> {
    let club = state.club.clone();
    let post = detached(async move { club.create_post(&actor, draft).await }).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/posts/:id
pub async fn update_post(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(draft): Json<PostDraft>,
) -> Result<Json<Post>> {
    let club = state.club.clone();
    let id = PostId::new(id);
    let post = detached(async move { club.update_post(&actor, &id, draft).await }).await?;
    Ok(Json(post))
}

/// DELETE /api/posts/:id
/// Removes the post and its whole comment thread
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let club = state.club.clone();
    let id = PostId::new(id);
    detached(async move { club.delete_post(&actor, &id).await }).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/posts/:id/comments
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let club = state.club.clone();
    let id = PostId::new(id);
    let comment = detached(async move { club.add_comment(&actor, &id, &req.body).await }).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// PUT /api/posts/:id/comments/:comment_id
pub async fn edit_comment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((id, comment_id)): Path<(String, String)>,
    Json(req): Json<CommentRequest>,
) -> Result<Json<Comment>> {
    let club = state.club.clone();
    let (id, comment_id) = (PostId::new(id), CommentId::new(comment_id));
    let comment = detached(async move {
        club.edit_comment(&actor, &id, &comment_id, &req.body).await
    })
    .await?;
    Ok(Json(comment))
}

/// DELETE /api/posts/:id/comments/:comment_id
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let club = state.club.clone();
    let (id, comment_id) = (PostId::new(id), CommentId::new(comment_id));
    detached(async move { club.delete_comment(&actor, &id, &comment_id).await }).await?;
    Ok(StatusCode::NO_CONTENT)
}
