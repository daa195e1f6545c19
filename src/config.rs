//! Server configuration from the environment (and `.env`, if present).

use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid PORT {0:?}")]
    InvalidPort(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Bind address, e.g. 0.0.0.0 so the app is reachable on a VPS.
    pub host: String,
    pub port: u16,
    /// env_logger filter used when RUST_LOG is unset.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Read HOST, PORT and RUST_LOG, falling back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        let port = match env::var("PORT") {
            Ok(p) => p.trim().parse().map_err(|_| ConfigError::InvalidPort(p))?,
            Err(_) => defaults.port,
        };
        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port,
            log_filter: env::var("RUST_LOG").unwrap_or(defaults.log_filter),
        })
    }
}
