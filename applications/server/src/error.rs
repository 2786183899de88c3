//! Server error types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ensemble_core::{AuthFailure, ClubError};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Club(#[from] ClubError),

    #[error("Storage error: {0}")]
    Storage(#[from] ensemble_storage::StorageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

impl ServerError {
    /// Stable machine-readable code for the response body
    pub fn code(&self) -> &'static str {
        match self {
            ServerError::Auth(_) | ServerError::Jwt(_) => "invalid_token",
            ServerError::BadRequest(_) => "bad_request",
            ServerError::Club(e) => e.code(),
            ServerError::Storage(_) => "persistence",
            ServerError::Config(_) => "config",
            ServerError::Internal(_) | ServerError::Io(_) | ServerError::Bcrypt(_) => "internal",
        }
    }
}

fn club_status(err: &ClubError) -> StatusCode {
    match err {
        ClubError::Validation(_) | ClubError::Serialization(_) => StatusCode::BAD_REQUEST,
        ClubError::Conflict(_) => StatusCode::CONFLICT,
        ClubError::Auth(AuthFailure::PendingApproval) => StatusCode::FORBIDDEN,
        ClubError::Auth(_) => StatusCode::UNAUTHORIZED,
        ClubError::PermissionDenied(_) | ClubError::ProtectedAccount(_) => StatusCode::FORBIDDEN,
        ClubError::NotFound { .. } => StatusCode::NOT_FOUND,
        ClubError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        ClubError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, error_message) = match self {
            ServerError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::Club(ref e) => {
                let status = club_status(e);
                if status.is_server_error() {
                    tracing::error!("Club error: {}", e);
                }
                // Persistence text is surfaced verbatim
                (status, e.to_string())
            }
            ServerError::Storage(ref e) => {
                tracing::error!("Storage error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ServerError::Config(ref msg) => {
                tracing::error!("Config error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
            ServerError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ServerError::Io(ref e) => {
                tracing::error!("IO error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "IO error".to_string())
            }
            ServerError::Jwt(ref e) => {
                tracing::warn!("JWT error: {:?}", e);
                (StatusCode::UNAUTHORIZED, "Invalid token".to_string())
            }
            ServerError::Bcrypt(ref e) => {
                tracing::error!("Bcrypt error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Password error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
