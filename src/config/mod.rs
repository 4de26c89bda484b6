//! Configuration module for the library backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::auth::TokenService;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("LIBRARY_JWT_SECRET must be configured in production")]
    MissingSecret,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment (development or production)
    pub environment: Environment,
    /// Secret used to sign identity tokens (required in production)
    pub jwt_secret: Option<String>,
    /// Identity token lifetime in seconds
    pub token_ttl_secs: i64,
    /// Directory holding users.json, books.json and events.json
    pub data_dir: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Origins allowed by CORS; empty means any origin
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("LIBRARY_ENV").as_deref() {
            None | Some("development") | Some("dev") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "LIBRARY_ENV",
                    value: other.to_string(),
                })
            }
        };

        let jwt_secret = lookup("LIBRARY_JWT_SECRET").filter(|s| !s.trim().is_empty());

        let token_ttl_secs = match lookup("LIBRARY_TOKEN_TTL_SECS") {
            None => 3600,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|secs| (1..=TokenService::MAX_TTL_SECS).contains(secs))
                .ok_or(ConfigError::InvalidValue {
                    key: "LIBRARY_TOKEN_TTL_SECS",
                    value: raw,
                })?,
        };

        let data_dir = lookup("LIBRARY_DATA_DIR")
            .unwrap_or_else(|| "./data".to_string())
            .into();

        let raw_addr = lookup("LIBRARY_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3001".to_string());
        let bind_addr = raw_addr.parse().map_err(|_| ConfigError::InvalidValue {
            key: "LIBRARY_BIND_ADDR",
            value: raw_addr.clone(),
        })?;

        let log_level = lookup("LIBRARY_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let allowed_origins = lookup("LIBRARY_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            environment,
            jwt_secret,
            token_ttl_secs,
            data_dir,
            bind_addr,
            log_level,
            allowed_origins,
        })
    }

    /// Resolve the token signing secret.
    ///
    /// Production refuses to start without a configured secret. Development falls
    /// back to a random per-process secret, so tokens do not survive a restart.
    pub fn signing_secret(&self) -> Result<String, ConfigError> {
        match (&self.jwt_secret, self.environment) {
            (Some(secret), _) => Ok(secret.clone()),
            (None, Environment::Production) => Err(ConfigError::MissingSecret),
            (None, Environment::Development) => {
                tracing::warn!(
                    "No LIBRARY_JWT_SECRET configured; using an ephemeral development secret"
                );
                Ok(format!(
                    "{}{}",
                    uuid::Uuid::new_v4().simple(),
                    uuid::Uuid::new_v4().simple()
                ))
            }
        }
    }
}
