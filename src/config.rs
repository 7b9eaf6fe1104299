//! Process configuration from environment variables

use crate::registry::RegistryScope;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 900;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a valid port number, got {value:?}")]
    InvalidPort { var: &'static str, value: String },
    #[error("{var} must be `global` or `conversation`, got {value:?}")]
    InvalidScope { var: &'static str, value: String },
    #[error("{var} must be true or false, got {value:?}")]
    InvalidBool { var: &'static str, value: String },
    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidSeconds { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub registry_scope: RegistryScope,
    /// Give claimed seats back to drivers when a session resets
    pub restore_seats_on_reset: bool,
    /// Stop idle conversation tasks after this long; `None` when set to 0
    pub idle_timeout: Option<Duration>,
}

impl AppConfig {
    /// Load configuration, reading a `.env` file first if one exists
    pub fn from_env() -> Result<Self, ConfigError> {
        // Missing .env is normal outside development
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_path = lookup("CARPOOL_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".carpool").join("carpool.db")
            },
            PathBuf::from,
        );

        let port = match lookup("CARPOOL_PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidPort {
                var: "CARPOOL_PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let registry_scope = match lookup("CARPOOL_REGISTRY_SCOPE") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidScope {
                var: "CARPOOL_REGISTRY_SCOPE",
                value,
            })?,
            None => RegistryScope::default(),
        };

        let restore_seats_on_reset = match lookup("CARPOOL_RESTORE_SEATS_ON_RESET") {
            Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidBool {
                var: "CARPOOL_RESTORE_SEATS_ON_RESET",
                value,
            })?,
            None => false,
        };

        let idle_timeout_secs = match lookup("CARPOOL_IDLE_TIMEOUT_SECS") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidSeconds {
                var: "CARPOOL_IDLE_TIMEOUT_SECS",
                value,
            })?,
            None => DEFAULT_IDLE_TIMEOUT_SECS,
        };
        let idle_timeout = (idle_timeout_secs > 0).then(|| Duration::from_secs(idle_timeout_secs));

        Ok(Self {
            db_path,
            port,
            registry_scope,
            restore_seats_on_reset,
            idle_timeout,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
