//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is read first if present.

use crate::services::walker::InvalidCoordinatePolicy;
use std::env;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Viewer front-end origin, allowed by CORS
    pub frontend_url: String,
    /// Conservation-area dataset (URL or path), EPSG:3857
    pub kawasan_source: String,
    /// Getaci dataset (URL or path), EPSG:4326
    pub getaci_source: String,
    /// Upper bound on a single dataset fetch
    pub fetch_timeout: Duration,
    /// Handling of coordinates that fail to reproject
    pub invalid_coordinates: InvalidCoordinatePolicy,
}

impl Default for Config {
    /// Defaults for every setting, reading the bundled datasets.
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            frontend_url: "http://localhost:5173".to_string(),
            kawasan_source: "data/shp_kk2.geojson".to_string(),
            getaci_source: "data/getaci.geojson".to_string(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            invalid_coordinates: InvalidCoordinatePolicy::Keep,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup. Unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw,
                reason: "expected a port number".to_string(),
            })?,
            None => defaults.port,
        };

        let fetch_timeout = match lookup("FETCH_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "FETCH_TIMEOUT_SECS",
                        value: raw,
                        reason: "expected a positive number of seconds".to_string(),
                    })
                }
            },
            None => defaults.fetch_timeout,
        };

        let invalid_coordinates = match lookup("INVALID_COORDINATES") {
            Some(raw) => raw
                .parse::<InvalidCoordinatePolicy>()
                .map_err(|reason| ConfigError::Invalid {
                    key: "INVALID_COORDINATES",
                    value: raw.clone(),
                    reason,
                })?,
            None => defaults.invalid_coordinates,
        };

        Ok(Self {
            port,
            frontend_url: lookup("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            kawasan_source: lookup("KAWASAN_SOURCE").unwrap_or(defaults.kawasan_source),
            getaci_source: lookup("GETACI_SOURCE").unwrap_or(defaults.getaci_source),
            fetch_timeout,
            invalid_coordinates,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
