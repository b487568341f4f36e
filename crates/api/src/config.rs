use std::env;
use std::str::FromStr;

use sitecraft_core::preview::DEFAULT_PREVIEW_TTL_SECS;
use sitecraft_core::revision::DEFAULT_RETENTION;
use sitecraft_core::ServiceConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a valid {expected}, got `{value}`")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("{key} must be set")]
    Missing { key: &'static str },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// PostgreSQL connection URL. Without one, pages live in memory.
    pub database_url: Option<String>,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Minimum database connections in the pool.
    pub db_min_connections: u32,
    /// HS256 secret used to verify admin bearer tokens.
    pub jwt_secret: String,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
    /// Revisions kept per page.
    pub revision_retention: usize,
    /// Preview token lifetime in seconds.
    pub preview_ttl_secs: i64,
    /// Interval between expired preview token sweeps, in seconds.
    pub preview_sweep_secs: u64,
    /// Maximum request body size.
    pub body_limit_bytes: usize,
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn parsed<T: FromStr>(
    lookup: Lookup<'_>,
    key: &'static str,
    default: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    let value = lookup(key).unwrap_or_else(|| default.to_string());
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        expected,
        value,
    })
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    /// `JWT_SECRET` has no default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup: Lookup<'_> = &lookup;
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: text("HOST", "0.0.0.0"),
            port: parsed(lookup, "PORT", "3030", "u16")?,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            db_max_connections: parsed(lookup, "DB_MAX_CONNECTIONS", "20", "u32")?,
            db_min_connections: parsed(lookup, "DB_MIN_CONNECTIONS", "5", "u32")?,
            jwt_secret: lookup("JWT_SECRET")
                .filter(|secret| !secret.trim().is_empty())
                .ok_or(ConfigError::Missing { key: "JWT_SECRET" })?,
            event_bus_capacity: parsed(lookup, "EVENT_BUS_CAPACITY", "1024", "usize")?,
            log_level: text("LOG_LEVEL", "info"),
            revision_retention: parsed(lookup, "REVISION_RETENTION", &DEFAULT_RETENTION.to_string(), "usize")?,
            preview_ttl_secs: parsed(lookup, "PREVIEW_TTL_SECS", &DEFAULT_PREVIEW_TTL_SECS.to_string(), "i64")?,
            preview_sweep_secs: parsed(lookup, "PREVIEW_SWEEP_SECS", "60", "u64")?,
            body_limit_bytes: parsed(lookup, "BODY_LIMIT_BYTES", "2097152", "usize")?,
        })
    }

    /// Defaults for tests and local tooling: in-memory store, loopback host.
    pub fn local(jwt_secret: &str) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: None,
            db_max_connections: 5,
            db_min_connections: 1,
            jwt_secret: jwt_secret.to_string(),
            event_bus_capacity: 256,
            log_level: "info".to_string(),
            revision_retention: DEFAULT_RETENTION,
            preview_ttl_secs: DEFAULT_PREVIEW_TTL_SECS,
            preview_sweep_secs: 60,
            body_limit_bytes: 2 * 1024 * 1024,
        }
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            revision_retention: self.revision_retention,
            preview_ttl: chrono::Duration::seconds(self.preview_ttl_secs),
        }
    }
}
