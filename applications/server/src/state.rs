//! Shared application state
use crate::services::AuthService;
use ensemble_club::Club;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub club: Arc<Club>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(club: Arc<Club>, auth_service: Arc<AuthService>) -> Self {
        Self { club, auth_service }
    }
}
