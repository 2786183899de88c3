//! API route modules
pub mod admin;
pub mod auth;
pub mod health;
pub mod me;
pub mod people;
pub mod posts;
pub mod songs;

use crate::{
    error::{Result, ServerError},
    middleware,
    state::AppState,
};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::future::Future;

/// All `/api` routes; everything but health and the auth endpoints needs a
/// bearer token.
pub fn router(state: AppState) -> Router<AppState> {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/signup", post(auth::signup));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        // Session
        .route("/me", get(me::get_me).put(me::update_me))
        // Playlist
        .route("/songs", get(songs::list_songs).post(songs::create_song))
        .route("/songs/suggest", get(songs::suggest))
        .route("/songs/live", get(songs::live))
        .route(
            "/songs/:id",
            get(songs::get_song)
                .put(songs::update_song)
                .delete(songs::delete_song),
        )
        // By-person lookup
        .route("/people", get(people::find))
        .route("/people/suggest", get(people::suggest))
        // Board
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/:id/comments", post(posts::add_comment))
        .route(
            "/posts/:id/comments/:comment_id",
            put(posts::edit_comment).delete(posts::delete_comment),
        )
        // Admin
        .route("/admin/signups", get(admin::list_signups))
        .route("/admin/signups/:id/approve", post(admin::approve_signup))
        .route("/admin/signups/:id/reject", post(admin::reject_signup))
        .route("/admin/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/admin/users/:id",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route("/admin/users/:id/password", post(admin::reset_password))
        .route("/admin/logs", get(admin::list_logs).delete(admin::clear_logs))
        .route("/admin/logs/export", get(admin::export_logs))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    public_routes.merge(protected_routes)
}

/// Run a club mutation on its own task so it completes even when the
/// client disconnects mid-request.
pub(crate) async fn detached<T, F>(mutation: F) -> Result<T>
where
    F: Future<Output = ensemble_core::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(mutation)
        .await
        .map_err(|e| ServerError::Internal(format!("mutation task failed: {}", e)))?
        .map_err(ServerError::from)
}
