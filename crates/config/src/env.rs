use beacon_common::error::{BeaconError, BeaconResult};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub hubspot_base_url: String,
    pub hubspot_client_id: String,
    pub hubspot_client_secret: String,
    pub hubspot_timeout_secs: u64,
    pub sink_url: String,
    pub log_level: String,
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub flush_threshold: usize,
    pub max_in_flight: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present, then reads required vars.
    pub fn from_env() -> BeaconResult<Self> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: get_var("DATABASE_URL")?,
            hubspot_base_url: get_var_or("HUBSPOT_BASE_URL", "https://api.hubapi.com"),
            hubspot_client_id: get_var("HUBSPOT_CLIENT_ID")?,
            hubspot_client_secret: get_var("HUBSPOT_CLIENT_SECRET")?,
            hubspot_timeout_secs: parse_var_or("HUBSPOT_TIMEOUT_SECS", 30)?,
            sink_url: get_var("SINK_URL")?,
            log_level: get_var_or("LOG_LEVEL", "info"),
            max_attempts: parse_var_or("SYNC_MAX_ATTEMPTS", 4)?,
            retry_base_delay_ms: parse_var_or("SYNC_RETRY_BASE_DELAY_MS", 5000)?,
            flush_threshold: parse_var_or("SYNC_FLUSH_THRESHOLD", 2000)?,
            max_in_flight: parse_var_or("SYNC_MAX_IN_FLIGHT", 4)?,
        })
    }
}

fn get_var(key: &str) -> BeaconResult<String> {
    env::var(key).map_err(|_| BeaconError::Config(format!("{key} is required but not set")))
}

fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_var_or<T: std::str::FromStr>(key: &str, default: T) -> BeaconResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| BeaconError::Config(format!("invalid {key}: {raw}"))),
        Err(_) => Ok(default),
    }
}
