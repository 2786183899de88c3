//! Common test utilities and fixtures
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use ensemble_club::{Club, ClubConfig};
use ensemble_core::Backend;
use ensemble_server::{services::AuthService, state::AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

/// Test credentials
pub mod fixtures {
    pub const ADMIN_PASSWORD: &str = "AdminPassword456!";
    pub const ADMIN_EMAIL: &str = "admin@club.test";
    pub const JWT_SECRET: &str = "test-secret-key-for-testing";
}

/// Router over a club in a temp SQLite file
pub struct TestApp {
    pub router: Router,
    pub club: Arc<Club>,
    pub auth_service: Arc<AuthService>,
    _temp_dir: TempDir,
}

pub fn create_test_auth_service() -> AuthService {
    AuthService::new(
        fixtures::JWT_SECRET.to_string(),
        1, // 1 hour access token
        1, // 1 day refresh token
    )
    .with_bcrypt_cost(4)
}

pub async fn create_test_app(backend: Backend) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_url = format!("sqlite://{}", temp_dir.path().join("club.db").display());
    let store = ensemble_storage::open_store(backend, &db_url).await.unwrap();

    let auth_service = Arc::new(create_test_auth_service());
    let config = match backend {
        Backend::Local => ClubConfig::local(fixtures::ADMIN_PASSWORD),
        Backend::Cloud => ClubConfig::cloud(fixtures::ADMIN_PASSWORD, fixtures::ADMIN_EMAIL),
    };
    let club = Arc::new(
        Club::open(store, config, auth_service.clone())
            .await
            .unwrap(),
    );

    let state = AppState::new(club.clone(), auth_service.clone());
    let router = ensemble_server::app(state, temp_dir.path().join("web"));

    TestApp {
        router,
        club,
        auth_service,
        _temp_dir: temp_dir,
    }
}

impl TestApp {
    /// Send one request and decode the JSON body (Null when empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Log in and return the access token
    pub async fn login(&self, login: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "login": login, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        let login = match self.club.mode() {
            Backend::Local => "admin",
            Backend::Cloud => fixtures::ADMIN_EMAIL,
        };
        self.login(login, fixtures::ADMIN_PASSWORD).await
    }

    /// Register `name` (local backend), approve it and log in
    pub async fn member_token(&self, name: &str) -> String {
        let admin = self.admin_token().await;
        let (status, outcome) = self
            .send(
                "POST",
                "/api/auth/signup",
                None,
                Some(serde_json::json!({
                    "name": name,
                    "password": "pw",
                    "confirm": "pw",
                    "dept": "Computer Science",
                    "part": "Drums",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let id = outcome["id"].as_str().unwrap();

        let (status, _) = self
            .send(
                "POST",
                &format!("/api/admin/signups/{}/approve", id),
                Some(&admin),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        self.login(name, "pw").await
    }
}
