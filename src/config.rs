//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults.
//! The JWT secret is only read from the JWT_SECRET env var, never from the
//! TOML file, so it cannot be committed alongside the config.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use chrono::Duration;
use serde::Deserialize;
use thiserror::Error;
use crate::domains::auth::services::SessionPolicy;

/// 토큰 수명 상한 (10년)
const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// 시계 오차 허용 상한 (1시간)
const MAX_LEEWAY_SECS: i64 = 60 * 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub sweep: SweepConfig,
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Allowed CORS origin (frontend)
    pub cors_origin: String,
    /// Public base URL used in activation links
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3002)),
            cors_origin: "http://localhost:3003".to_string(),
            public_url: "http://localhost:3002".to_string(),
        }
    }
}

/// PostgreSQL settings. Without a URL the service runs on in-memory stores.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

/// Token and session lifetimes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(skip)]
    pub jwt_secret: Option<String>,
    pub access_ttl_secs: i64,
    pub session_ttl_secs: i64,
    /// Clock skew tolerated when checking token timestamps
    pub clock_leeway_secs: i64,
    pub activation_ttl_secs: i64,
    pub google_client_id: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_ttl_secs: 15 * 60,
            session_ttl_secs: 7 * 24 * 60 * 60,
            clock_leeway_secs: 30,
            activation_ttl_secs: 15 * 60,
            google_client_id: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// false면 스케줄러 태스크는 돌지만 정리는 건너뜀
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of human-readable output
    pub json: bool,
}

impl Config {
    /// Load configuration from an optional TOML file, then overlay
    /// environment variables.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml(&contents)?
        } else {
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Overlay values from the environment. `lookup` is injectable for tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|s| !s.is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(client_id) = lookup("GOOGLE_CLIENT_ID").filter(|s| !s.is_empty()) {
            self.auth.google_client_id = Some(client_id);
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.server.listen_addr.set_port(port);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let auth = &self.auth;
        if auth.access_ttl_secs <= 0 || auth.session_ttl_secs <= 0 || auth.activation_ttl_secs <= 0 {
            return Err(ConfigError::Invalid("token lifetimes must be greater than 0".into()));
        }
        if auth.access_ttl_secs > MAX_TTL_SECS
            || auth.session_ttl_secs > MAX_TTL_SECS
            || auth.activation_ttl_secs > MAX_TTL_SECS
        {
            return Err(ConfigError::Invalid(format!(
                "token lifetimes must not exceed {MAX_TTL_SECS} seconds"
            )));
        }
        if auth.access_ttl_secs >= auth.session_ttl_secs {
            return Err(ConfigError::Invalid(
                "access_ttl_secs must be shorter than session_ttl_secs".into(),
            ));
        }
        if !(0..=MAX_LEEWAY_SECS).contains(&auth.clock_leeway_secs) {
            return Err(ConfigError::Invalid(format!(
                "clock_leeway_secs must be between 0 and {MAX_LEEWAY_SECS}"
            )));
        }
        if self.sweep.interval_secs == 0 {
            return Err(ConfigError::Invalid("sweep interval_secs must be greater than 0".into()));
        }
        // Postgres 모드에서는 비밀키 필수 (재시작 후에도 토큰이 유효해야 함)
        if self.database.url.is_some() && auth.jwt_secret.is_none() {
            return Err(ConfigError::Invalid(
                "JWT_SECRET must be set when a database is configured".into(),
            ));
        }
        Ok(())
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            access_ttl: Duration::seconds(self.auth.access_ttl_secs),
            session_ttl: Duration::seconds(self.auth.session_ttl_secs),
        }
    }

    pub fn activation_ttl(&self) -> Duration {
        Duration::seconds(self.auth.activation_ttl_secs)
    }

    /// Resolve config file path from the CONFIG_PATH env var.
    pub fn resolve_path() -> PathBuf {
        std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("catalog-api.toml"))
    }
}
