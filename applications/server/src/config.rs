//! Server configuration
use crate::error::{Result, ServerError};
use ensemble_club::ClubConfig;
use ensemble_core::Backend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_auth")]
    pub auth: AuthSettings,

    #[serde(default = "default_club")]
    pub club: ClubSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the web UI build
    #[serde(default = "default_web_dir")]
    pub web_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_backend")]
    pub backend: Backend,

    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration_hours")]
    pub jwt_expiration_hours: u64,

    #[serde(default = "default_jwt_refresh_expiration_days")]
    pub jwt_refresh_expiration_days: u64,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Credential of the `admin` account
    #[serde(default)]
    pub admin_password: String,

    /// Address granted admin on registration (cloud backend)
    #[serde(default)]
    pub admin_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClubSettings {
    #[serde(default = "default_require_approval")]
    pub require_approval: bool,
}

impl ServerConfig {
    /// Load configuration from `config.toml` (or `path`) and environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        // Load from config file if it exists
        let config_path = path.map_or_else(|| PathBuf::from("config.toml"), Path::to_path_buf);
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        }

        // Override with environment variables (prefixed with ENSEMBLE_)
        settings = settings.add_source(
            config::Environment::with_prefix("ENSEMBLE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ServerError::Config(
                "JWT secret is required (set ENSEMBLE_AUTH__JWT_SECRET)".to_string(),
            ));
        }

        if self.auth.admin_password.is_empty() {
            return Err(ServerError::Config(
                "admin password is required (set ENSEMBLE_AUTH__ADMIN_PASSWORD)".to_string(),
            ));
        }

        if self.storage.backend == Backend::Cloud && self.auth.admin_email.is_none() {
            tracing::warn!("No admin email configured; cloud registrations cannot become admin");
        }

        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(ServerError::Config(format!(
                "bcrypt cost must be between 4 and 31, got {}",
                self.auth.bcrypt_cost
            )));
        }

        Ok(())
    }

    /// Club settings derived from this configuration
    pub fn club_config(&self) -> ClubConfig {
        ClubConfig {
            mode: self.storage.backend,
            require_approval: self.club.require_approval,
            admin_password: self.auth.admin_password.clone(),
            admin_email: self.auth.admin_email.clone(),
        }
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
        web_dir: default_web_dir(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_web_dir() -> PathBuf {
    PathBuf::from("/app/web")
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        backend: default_backend(),
        database_url: default_database_url(),
    }
}

fn default_backend() -> Backend {
    Backend::Local
}

fn default_database_url() -> String {
    "sqlite://./data/ensemble.db".to_string()
}

fn default_auth() -> AuthSettings {
    AuthSettings {
        jwt_secret: String::new(),
        jwt_expiration_hours: default_jwt_expiration_hours(),
        jwt_refresh_expiration_days: default_jwt_refresh_expiration_days(),
        bcrypt_cost: default_bcrypt_cost(),
        admin_password: String::new(),
        admin_email: None,
    }
}

fn default_jwt_expiration_hours() -> u64 {
    24
}

fn default_jwt_refresh_expiration_days() -> u64 {
    30
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_club() -> ClubSettings {
    ClubSettings {
        require_approval: default_require_approval(),
    }
}

fn default_require_approval() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            storage: default_storage(),
            auth: default_auth(),
            club: default_club(),
        }
    }
}
