//! Backend configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use masseria_core::DEFAULT_SLOT_CAPACITY;

/// Backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file (`MASSERIA_DB_PATH`)
    pub database_path: PathBuf,

    /// Connection pool size (`MASSERIA_DB_MAX_CONNECTIONS`)
    pub max_connections: u32,

    /// Reservations accepted per slot (`MASSERIA_SLOT_CAPACITY`)
    pub slot_capacity: i64,

    /// Maximum rows returned by history queries (`MASSERIA_HISTORY_LIMIT`)
    pub history_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: PathBuf::from("./masseria.db"),
            max_connections: 5,
            slot_capacity: DEFAULT_SLOT_CAPACITY,
            history_limit: 100,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let config = AppConfig {
            database_path: lookup("MASSERIA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_or(&lookup, "MASSERIA_DB_MAX_CONNECTIONS", defaults.max_connections)?,

            slot_capacity: parse_or(&lookup, "MASSERIA_SLOT_CAPACITY", defaults.slot_capacity)?,

            history_limit: parse_or(&lookup, "MASSERIA_HISTORY_LIMIT", defaults.history_limit)?,
        };

        if config.slot_capacity <= 0 {
            return Err(ConfigError::InvalidValue("MASSERIA_SLOT_CAPACITY".to_string()));
        }
        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("MASSERIA_DB_MAX_CONNECTIONS".to_string()));
        }
        if config.history_limit == 0 {
            return Err(ConfigError::InvalidValue("MASSERIA_HISTORY_LIMIT".to_string()));
        }

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.database_path, PathBuf::from("./masseria.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.slot_capacity, 5);
        assert_eq!(config.history_limit, 100);
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("MASSERIA_DB_PATH", "/var/lib/masseria/data.db"),
            ("MASSERIA_SLOT_CAPACITY", "8"),
            ("MASSERIA_HISTORY_LIMIT", " 25 "),
        ])
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/masseria/data.db"));
        assert_eq!(config.slot_capacity, 8);
        assert_eq!(config.history_limit, 25);
    }

    #[test]
    fn test_invalid_values() {
        let err = from_pairs(&[("MASSERIA_SLOT_CAPACITY", "0")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for MASSERIA_SLOT_CAPACITY");

        assert!(from_pairs(&[("MASSERIA_SLOT_CAPACITY", "cinco")]).is_err());
        assert!(from_pairs(&[("MASSERIA_DB_MAX_CONNECTIONS", "-1")]).is_err());
        assert!(from_pairs(&[("MASSERIA_HISTORY_LIMIT", "0")]).is_err());
    }
}
