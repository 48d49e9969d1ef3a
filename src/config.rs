/// Environment-driven configuration.
///
/// All credentials and API parameters come from the process environment,
/// optionally seeded from a `.env` file. Construction fails fast, before any
/// I/O, and a single error enumerates every missing variable so one run
/// reports the full shortfall.

use std::env;
use std::path::Path;

use crate::model::IngestError;

/// Load environment variables from a `.env` file if present.
///
/// An explicit path is loaded from that location; otherwise the default
/// discovery walk is used. A missing file is not an error — the variables
/// may already be set in the environment.
pub fn load_environment(env_file: Option<&Path>) {
    match env_file {
        Some(path) => {
            let _ = dotenv::from_path(path);
        }
        None => {
            let _ = dotenv::dotenv();
        }
    }
}

// ---------------------------------------------------------------------------
// Database configuration
// ---------------------------------------------------------------------------

/// Connection settings for PostgreSQL.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl DatabaseConfig {
    /// Build from the `PG_*` environment variables.
    pub fn from_env() -> Result<Self, IngestError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build using an injected lookup, so tests never mutate the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IngestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut require = |key: &str| -> String {
            match lookup(key) {
                Some(value) => value,
                None => {
                    missing.push(key.to_string());
                    String::new()
                }
            }
        };

        let host = require("PG_HOST");
        let port_raw = require("PG_PORT");
        let database = require("PG_DB");
        let user = require("PG_USER");
        let password = require("PG_PASSWORD");

        if !missing.is_empty() {
            return Err(IngestError::MissingConfig(missing));
        }

        let port = port_raw.parse::<u16>().map_err(|_| {
            IngestError::ParseError(format!("PG_PORT is not a valid port: {:?}", port_raw))
        })?;

        Ok(DatabaseConfig {
            host,
            port,
            database,
            user,
            password,
        })
    }
}

// ---------------------------------------------------------------------------
// AirNow API configuration
// ---------------------------------------------------------------------------

/// Query parameters for the AirNow observation API.
///
/// Only the API key is required; the remaining parameters carry the same
/// defaults the service has always run with.
#[derive(Debug, Clone, PartialEq)]
pub struct AirNowConfig {
    pub api_key: String,
    pub zip_code: String,
    pub distance: u32,
    pub response_format: String,
}

impl AirNowConfig {
    pub fn from_env() -> Result<Self, IngestError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, IngestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = match lookup("AIRNOW_API_KEY") {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(IngestError::MissingConfig(vec![
                    "AIRNOW_API_KEY".to_string(),
                ]));
            }
        };
        let zip_code = lookup("AIRNOW_ZIP_CODE").unwrap_or_else(|| "27705".to_string());
        let distance = match lookup("AIRNOW_DISTANCE") {
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                IngestError::ParseError(format!("AIRNOW_DISTANCE is not a number: {:?}", raw))
            })?,
            None => 25,
        };
        let response_format =
            lookup("AIRNOW_FORMAT").unwrap_or_else(|| "application/json".to_string());

        Ok(AirNowConfig {
            api_key,
            zip_code,
            distance,
            response_format,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn full_pg_env(key: &str) -> Option<String> {
        match key {
            "PG_HOST" => Some("localhost".to_string()),
            "PG_PORT" => Some("5432".to_string()),
            "PG_DB" => Some("air_quality_db".to_string()),
            "PG_USER" => Some("aq_admin".to_string()),
            "PG_PASSWORD" => Some("secret".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_database_config_from_complete_environment() {
        let config = DatabaseConfig::from_lookup(full_pg_env).expect("all keys present");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "air_quality_db");
        assert_eq!(config.user, "aq_admin");
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn test_database_config_enumerates_every_missing_variable() {
        // Only the host is set — the error must name all four missing keys,
        // not just the first one encountered.
        let result = DatabaseConfig::from_lookup(|key| {
            if key == "PG_HOST" {
                Some("localhost".to_string())
            } else {
                None
            }
        });
        match result {
            Err(IngestError::MissingConfig(names)) => {
                assert_eq!(
                    names,
                    vec!["PG_PORT", "PG_DB", "PG_USER", "PG_PASSWORD"],
                    "every missing variable should be listed"
                );
            }
            other => panic!("expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_database_config_rejects_non_numeric_port() {
        let result = DatabaseConfig::from_lookup(|key| {
            if key == "PG_PORT" {
                Some("not-a-port".to_string())
            } else {
                full_pg_env(key)
            }
        });
        assert!(matches!(result, Err(IngestError::ParseError(_))));
    }

    #[test]
    fn test_airnow_config_requires_api_key() {
        let result = AirNowConfig::from_lookup(|_| None);
        match result {
            Err(IngestError::MissingConfig(names)) => {
                assert_eq!(names, vec!["AIRNOW_API_KEY"]);
            }
            other => panic!("expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_airnow_config_applies_documented_defaults() {
        let config = AirNowConfig::from_lookup(|key| {
            if key == "AIRNOW_API_KEY" {
                Some("test-key".to_string())
            } else {
                None
            }
        })
        .expect("api key present");
        assert_eq!(config.zip_code, "27705");
        assert_eq!(config.distance, 25);
        assert_eq!(config.response_format, "application/json");
    }

    #[test]
    fn test_airnow_config_overrides_from_environment() {
        let config = AirNowConfig::from_lookup(|key| match key {
            "AIRNOW_API_KEY" => Some("test-key".to_string()),
            "AIRNOW_ZIP_CODE" => Some("61602".to_string()),
            "AIRNOW_DISTANCE" => Some("50".to_string()),
            _ => None,
        })
        .expect("api key present");
        assert_eq!(config.zip_code, "61602");
        assert_eq!(config.distance, 50);
    }
}
