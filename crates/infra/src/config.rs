//! Process configuration, read once at startup.
//!
//! Parsing is a pure function over a key lookup ([`AppConfig::from_lookup`]);
//! [`AppConfig::from_env`] plugs in the process environment.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use firmhub_auth::AuthConfig;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_JWT_EXPIRATION_HOURS: i64 = 24;
pub const DEFAULT_EVENT_BUS_URL: &str = "redis://localhost:6379";
pub const DEFAULT_API_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_APP_ENV: &str = "dev";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("unsupported database dialect: {0:?}")]
    UnsupportedDialect(String),
}

/// Storage backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseDialect {
    Postgres,
    MySql,
    Sqlite,
    Memory,
}

impl core::str::FromStr for DatabaseDialect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DatabaseDialect::Postgres),
            "mysql" | "mariadb" => Ok(DatabaseDialect::MySql),
            "sqlite" => Ok(DatabaseDialect::Sqlite),
            "memory" => Ok(DatabaseDialect::Memory),
            _ => Err(ConfigError::UnsupportedDialect(s.to_string())),
        }
    }
}

/// Event transport selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventBusKind {
    Redis,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub dialect: DatabaseDialect,
    /// Connection string; `None` only for [`DatabaseDialect::Memory`].
    pub url: Option<String>,
}

impl DatabaseConfig {
    pub fn memory() -> Self {
        Self {
            dialect: DatabaseDialect::Memory,
            url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBusConfig {
    pub kind: EventBusKind,
    pub url: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database: DatabaseConfig,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub event_bus: EventBusConfig,
    pub api_timeout_seconds: u64,
    pub log_level: String,
    pub app_env: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or(&get, "PORT", DEFAULT_PORT, |p| *p > 0)?;

        let dialect = match get("DATABASE_DIALECT") {
            Some(raw) => raw.parse()?,
            None => DatabaseDialect::Postgres,
        };
        let url = get("DATABASE_URL");
        if dialect != DatabaseDialect::Memory && url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let jwt_expiration_hours = parse_or(
            &get,
            "JWT_EXPIRATION_HOURS",
            DEFAULT_JWT_EXPIRATION_HOURS,
            |h| token_ttl(*h).is_some(),
        )?;

        let kind = match get("EVENT_BUS") {
            None => EventBusKind::Redis,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "redis" => EventBusKind::Redis,
                "memory" => EventBusKind::Memory,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "EVENT_BUS",
                        value: raw,
                    });
                }
            },
        };
        let event_bus = EventBusConfig {
            kind,
            url: get("EVENT_BUS_URL").unwrap_or_else(|| DEFAULT_EVENT_BUS_URL.to_string()),
        };

        let api_timeout_seconds = parse_or(
            &get,
            "API_TIMEOUT_SECONDS",
            DEFAULT_API_TIMEOUT_SECONDS,
            |s| *s > 0,
        )?;

        Ok(Self {
            port,
            database: DatabaseConfig { dialect, url },
            jwt_secret,
            jwt_expiration_hours,
            event_bus,
            api_timeout_seconds,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            app_env: get("APP_ENV").unwrap_or_else(|| DEFAULT_APP_ENV.to_string()),
        })
    }

    pub fn is_dev(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("dev")
    }

    pub fn auth(&self) -> Result<AuthConfig, ConfigError> {
        let ttl = token_ttl(self.jwt_expiration_hours).ok_or_else(|| ConfigError::Invalid {
            key: "JWT_EXPIRATION_HOURS",
            value: self.jwt_expiration_hours.to_string(),
        })?;
        Ok(AuthConfig::new(self.jwt_secret.clone(), ttl))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_seconds)
    }
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("database_dialect", &self.database.dialect)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("event_bus", &self.event_bus)
            .field("api_timeout_seconds", &self.api_timeout_seconds)
            .field("log_level", &self.log_level)
            .field("app_env", &self.app_env)
            .finish_non_exhaustive()
    }
}

/// Token lifetime for `hours`, if positive and representable as an expiry
/// for a token issued now.
fn token_ttl(hours: i64) -> Option<chrono::Duration> {
    chrono::Duration::try_hours(hours)
        .filter(|ttl| *ttl > chrono::Duration::zero())
        .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
}

fn parse_or<T, G, V>(get: &G, key: &'static str, default: T, valid: V) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    G: Fn(&str) -> Option<String>,
    V: Fn(&T) -> bool,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .ok()
            .filter(|v| valid(v))
            .ok_or(ConfigError::Invalid { key, value: raw }),
    }
}
