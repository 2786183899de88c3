//! Ensemble Server Library
//!
//! HTTP front end for the club app: playlist, by-person lookup, board and
//! admin tools over the `ensemble-club` core, with JWT sessions.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use services::auth::AuthService;
pub use state::AppState;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::IntoResponse,
    Router,
};
use std::path::PathBuf;
use tower::ServiceExt;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// The whole application: `/api` plus the web UI served from `web_dir`.
pub fn app(state: AppState, web_dir: PathBuf) -> Router {
    // Static file serving for web UI (SPA with fallback to index.html)
    let spa_fallback = move |req: Request<Body>| {
        let web_dir = web_dir.clone();
        async move {
            let path = req.uri().path().trim_start_matches('/');
            let file_path = web_dir.join(path);

            if !path.is_empty() && file_path.is_file() {
                match ServeDir::new(&web_dir).oneshot(req).await {
                    Ok(res) => res.into_response(),
                    Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                }
            } else {
                match tokio::fs::read(web_dir.join("index.html")).await {
                    Ok(contents) => (
                        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                        contents,
                    )
                        .into_response(),
                    // No web UI installed
                    Err(_) => StatusCode::NOT_FOUND.into_response(),
                }
            }
        }
    };

    Router::new()
        .nest("/api", api::router(state.clone()))
        .fallback(spa_fallback)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
