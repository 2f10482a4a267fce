//! Environment-backed configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{Context, Result};

/// Runtime configuration, loaded once at process start.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token for the Vapi voice-call API
    pub vapi_api_key: String,
    /// Provider-side id of the outbound phone number
    pub vapi_phone_number_id: String,
    /// Base URL of the Vapi API
    pub vapi_base_url: String,
    /// Path to the SQLite database file
    pub database_path: String,
    /// Seconds between due-reminder checks
    pub poll_interval_secs: u64,
    /// Upper bound on a single outbound call request
    pub call_timeout_secs: u64,
    /// Default log filter (RUST_LOG still wins when set)
    pub log_level: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// `VAPI_API_KEY` and `VAPI_PHONE_NUMBER_ID` are required; everything
    /// else falls back to a sensible default.
    pub fn from_env() -> Result<Self> {
        let vapi_api_key =
            std::env::var("VAPI_API_KEY").context("VAPI_API_KEY environment variable not set")?;
        let vapi_phone_number_id = std::env::var("VAPI_PHONE_NUMBER_ID")
            .context("VAPI_PHONE_NUMBER_ID environment variable not set")?;

        Ok(Config {
            vapi_api_key,
            vapi_phone_number_id,
            vapi_base_url: env_or("VAPI_BASE_URL", "https://api.vapi.ai"),
            database_path: env_or("DATABASE_PATH", "reminders.db"),
            poll_interval_secs: parse_env_or("POLL_INTERVAL_SECS", 30)?,
            call_timeout_secs: parse_env_or("CALL_TIMEOUT_SECS", 30)?,
            log_level: env_or("LOG_LEVEL", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a positive integer, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
