//! Inventory engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `EXPIRY_SCAN_DAYS` - Default window for the expiry scanner (default: 30)

use secrecy::SecretString;
use thiserror::Error;

/// Fallback expiry-scan window when `EXPIRY_SCAN_DAYS` is unset.
pub const DEFAULT_EXPIRY_SCAN_DAYS: u32 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidEnvVar { name: String, value: String },
}

/// Runtime configuration for the inventory engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// `PostgreSQL` connection string.
    pub database_url: SecretString,
    /// Default look-ahead window for expiry scans, in days. Consumed by
    /// [`crate::services::ExpiryScanner::from_config`].
    pub expiry_scan_days: u32,
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let expiry_scan_days = match std::env::var("EXPIRY_SCAN_DAYS") {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar {
                    name: "EXPIRY_SCAN_DAYS".to_string(),
                    value,
                })?,
            Err(_) => DEFAULT_EXPIRY_SCAN_DAYS,
        };

        Ok(Self {
            database_url: SecretString::from(database_url),
            expiry_scan_days,
        })
    }
}
