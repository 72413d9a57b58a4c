//! Application configuration loaded from a JSON file or environment variables.
//!
//! The Strava app registration (`client_id`, `client_secret`) is required.
//! Points of interest are optional and come from their own JSON file.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::models::PointOfInterest;

/// Default port of the local registration server.
pub const DEFAULT_AUTH_PORT: u16 = 5000;

/// Application configuration, loaded once at startup and passed explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Strava OAuth client ID (public)
    pub strava_client_id: String,
    /// Strava OAuth client secret
    pub strava_client_secret: String,
    /// Port of the registration server
    pub port: u16,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            port: DEFAULT_AUTH_PORT,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local use.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            strava_client_id: env::var("STRAVA_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_ID"))?,
            strava_client_secret: env::var("STRAVA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_SECRET"))?,
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_AUTH_PORT),
        })
    }

    /// Load configuration from a Strava app config JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json(&data)
    }

    /// Parse configuration from the JSON document `{"client_id": .., "client_secret": ..}`.
    ///
    /// Strava shows the client ID as a number, so both numbers and strings are accepted.
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let value: Value =
            serde_json::from_str(data).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let strava_client_id = match value.get("client_id") {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(ConfigError::Missing("client_id")),
        };
        let strava_client_secret = value
            .get("client_secret")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .ok_or(ConfigError::Missing("client_secret"))?;

        let port = value
            .get("port")
            .and_then(Value::as_u64)
            .and_then(|p| u16::try_from(p).ok())
            .unwrap_or(DEFAULT_AUTH_PORT);

        Ok(Self {
            strava_client_id,
            strava_client_secret,
            port,
        })
    }
}

#[derive(Deserialize)]
struct PoiLocation {
    lat: f64,
    lon: f64,
}

/// Load points of interest from a JSON file of the form `{"name": {"lat": .., "lon": ..}}`.
pub fn load_points_of_interest<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<PointOfInterest>, ConfigError> {
    let data = fs::read_to_string(path.as_ref())
        .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
    parse_points_of_interest(&data)
}

/// Parse points of interest. The result is ordered by name.
pub fn parse_points_of_interest(data: &str) -> Result<Vec<PointOfInterest>, ConfigError> {
    let map: BTreeMap<String, PoiLocation> =
        serde_json::from_str(data).map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok(map
        .into_iter()
        .map(|(name, location)| PointOfInterest {
            name,
            lat: location.lat,
            lon: location.lon,
        })
        .collect())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration key: {0}")]
    Missing(&'static str),

    #[error("Failed to read configuration: {0}")]
    Io(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}
