use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::DEFAULT_CLIP_DELAY_MS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Reconciliation
    pub reconcile_interval: Duration,
    pub clip_delay: Duration,
    pub http_timeout: Duration,

    // Database
    pub database_path: PathBuf,

    // Metrics providers
    pub metrics_api_key: String,
    pub instagram_api_base: String,
    pub tiktok_api_base: String,

    // Admin web server
    pub web_host: String,
    pub web_port: u16,
    pub admin_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            reconcile_interval: Duration::from_secs(parse_env_u64(
                "RECONCILE_INTERVAL_SECS",
                7200,
            )?),
            clip_delay: Duration::from_millis(parse_env_u64(
                "CLIP_DELAY_MS",
                DEFAULT_CLIP_DELAY_MS,
            )?),
            http_timeout: Duration::from_secs(parse_env_u64("HTTP_TIMEOUT_SECS", 30)?),

            database_path: PathBuf::from(env_or_default(
                "DATABASE_PATH",
                "./data/clipledger.sqlite",
            )),

            metrics_api_key: required_env("METRICS_API_KEY")?,
            instagram_api_base: env_or_default(
                "INSTAGRAM_API_BASE",
                "https://real-time-instagram-scraper-api1.p.rapidapi.com",
            ),
            tiktok_api_base: env_or_default(
                "TIKTOK_API_BASE",
                "https://tiktok-api23.p.rapidapi.com",
            ),

            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8080)?,
            admin_token: optional_env("ADMIN_TOKEN"),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metrics_api_key.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "METRICS_API_KEY".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.reconcile_interval < Duration::from_secs(60) {
            return Err(ConfigError::InvalidValue {
                name: "RECONCILE_INTERVAL_SECS".to_string(),
                message: "must be at least 60".to_string(),
            });
        }
        for (name, base) in [
            ("INSTAGRAM_API_BASE", &self.instagram_api_base),
            ("TIKTOK_API_BASE", &self.tiktok_api_base),
        ] {
            if url::Url::parse(base).is_err() {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("not a valid URL: {base}"),
                });
            }
        }
        Ok(())
    }

    /// A configuration suitable for tests: zero inter-clip delay, dummy
    /// provider credentials.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(3600),
            clip_delay: Duration::ZERO,
            http_timeout: Duration::from_secs(5),
            database_path: PathBuf::from(":memory:"),
            metrics_api_key: "test-key".to_string(),
            instagram_api_base: "https://instagram.invalid".to_string(),
            tiktok_api_base: "https://tiktok.invalid".to_string(),
            web_host: "127.0.0.1".to_string(),
            web_port: 0,
            admin_token: None,
        }
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
