//! Configuration loading and representation.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. optional `agrisync.toml` in the working directory
//! 3. `AGRISYNC_*` environment variables (e.g. `AGRISYNC_JWT_SECRET`)

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use agrisync_observability::LogFormat;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const CONFIG_FILE: &str = "agrisync";
const ENV_PREFIX: &str = "AGRISYNC";

/// Used when no secret is configured. Never use outside local development.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bind_addr: String,

    #[serde(default)]
    pub jwt_secret: Option<String>,

    #[serde(default)]
    pub storage: StorageBackend,

    #[serde(default)]
    pub database_url: Option<String>,

    pub db_max_connections: u32,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from defaults, the optional config file, then the environment.
    pub fn load() -> Result<Self, AppConfigError> {
        let config = Config::builder()
            .set_default("bind_addr", DEFAULT_BIND_ADDR)?
            .set_default("db_max_connections", i64::from(DEFAULT_MAX_CONNECTIONS))?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let cfg: AppConfig = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// In-memory configuration with a fixed secret, for tests and embedding.
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            jwt_secret: Some(jwt_secret.into()),
            storage: StorageBackend::Memory,
            database_url: None,
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
            log_format: LogFormat::Json,
        }
    }

    pub fn validate(&self) -> Result<(), AppConfigError> {
        if self.storage == StorageBackend::Postgres && self.database_url().is_none() {
            return Err(AppConfigError::Invalid(
                "storage is 'postgres' but no database_url is set (AGRISYNC_DATABASE_URL)".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured secret, or the development fallback (logged at `warn`).
    pub fn jwt_secret(&self) -> String {
        match self.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => {
                warn!("AGRISYNC_JWT_SECRET not set; using insecure development default");
                DEV_JWT_SECRET.to_string()
            }
        }
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
