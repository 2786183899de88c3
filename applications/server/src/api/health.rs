//! Health check API routes
use crate::state::AppState;
use axum::{extract::State, Json};
use ensemble_core::Backend;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: Backend,
}

/// GET /api/health - Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.club.mode(),
    })
}
