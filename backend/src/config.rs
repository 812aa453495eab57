//! Runtime settings.
//!
//! Values come from the environment (a `.env` file is loaded first when
//! present); CLI flags override them in `main.rs`.
//!
//! | Variable | Default |
//! |---|---|
//! | `ETL_DATABASE_PATH` | `sales.db` |
//! | `ETL_TABLE` | `orders` |
//! | `JOKES_DATABASE_PATH` | `jokes.db` |
//! | `JOKE_API_BASE_URL` | `https://v2.jokeapi.dev/joke` |
//! | `PORT` | `3000` |

use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::jokes::JOKE_API_BASE_URL;
use crate::models::TableName;
use crate::storage::DEFAULT_DATABASE;

pub const DEFAULT_JOKES_DATABASE: &str = "jokes.db";
pub const DEFAULT_PORT: u16 = 3000;

/// Settings shared by the CLI and the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub table: TableName,
    pub jokes_database_path: PathBuf,
    pub joke_api_base_url: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE),
            table: TableName::default(),
            jokes_database_path: PathBuf::from(DEFAULT_JOKES_DATABASE),
            joke_api_base_url: JOKE_API_BASE_URL.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let table = match get("ETL_TABLE") {
            Some(name) => TableName::parse(name)?,
            None => defaults.table,
        };

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnv {
                var: "PORT".to_string(),
                value: raw,
            })?,
            None => defaults.port,
        };

        Ok(Self {
            database_path: get("ETL_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            table,
            jokes_database_path: get("JOKES_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.jokes_database_path),
            joke_api_base_url: get("JOKE_API_BASE_URL").unwrap_or(defaults.joke_api_base_url),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.table.as_str(), "orders");
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ETL_DATABASE_PATH", "/data/sales.db"),
            ("ETL_TABLE", "orders_eu"),
            ("JOKE_API_BASE_URL", "http://localhost:9999/joke"),
            ("PORT", "8080"),
            ("JOKES_DATABASE_PATH", "  "),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/data/sales.db"));
        assert_eq!(config.table.as_str(), "orders_eu");
        assert_eq!(config.joke_api_base_url, "http://localhost:9999/joke");
        assert_eq!(config.port, 8080);
        assert_eq!(config.jokes_database_path, PathBuf::from(DEFAULT_JOKES_DATABASE));
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(lookup(&[("ETL_TABLE", "orders; --")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidTableName("orders; --".into()));

        let err = AppConfig::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref var, .. } if var == "PORT"));
    }
}
