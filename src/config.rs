//! Store configuration loaded from the environment.
//!
//! # Environment variables
//!
//! - `DATABASE_URL`: `PostgreSQL` connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
//! - `DATABASE_CONNECT_TIMEOUT_SECS`: pool checkout timeout (default: 30)
//!
//! A `.env` file in the working directory is loaded first when present.

use std::env;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while reading store configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    /// A numeric variable could not be parsed.
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber {
        /// Variable name.
        key: &'static str,
        /// Raw value found in the environment.
        value: String,
    },
}

/// Connection settings for the `PostgreSQL` store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Maximum time to wait for a pooled connection.
    pub connect_timeout: Duration,
}

impl StoreConfig {
    /// Loads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `DATABASE_URL` is missing or a numeric
    /// variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `DATABASE_URL` is missing or a numeric
    /// variable is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => parse_positive::<u32>("DATABASE_MAX_CONNECTIONS", &raw)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let timeout_secs = match lookup("DATABASE_CONNECT_TIMEOUT_SECS") {
            Some(raw) => parse_positive::<u64>("DATABASE_CONNECT_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_CONNECT_TIMEOUT_SECS,
        };

        Ok(Self {
            database_url,
            max_connections,
            connect_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_positive<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let invalid = || ConfigError::InvalidNumber {
        key,
        value: raw.to_owned(),
    };
    let value = raw.trim().parse::<T>().map_err(|_| invalid())?;
    if value == T::default() {
        return Err(invalid());
    }
    Ok(value)
}
