//! Configuration management for the storefront.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default backend base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// What was expected
        expected: &'static str,
        /// Raw value
        value: String,
    },

    /// The backend URL is not an absolute http(s) URL
    #[error("Invalid API URL {0:?}")]
    InvalidUrl(String),

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Storefront configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Base URL of the payment and ticket services
    pub api_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// How long the checkout success screen stays up
    pub success_display: Duration,
    /// Log filter (trace, debug, info, warn, error, or an `EnvFilter` directive)
    pub log_level: String,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            success_display: Duration::from_millis(3000),
            log_level: "info".to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("STOREFRONT_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_url);

        let request_timeout = parse_u64(&lookup, "STOREFRONT_REQUEST_TIMEOUT_SECS")?
            .map_or(defaults.request_timeout, Duration::from_secs);

        let success_display = parse_u64(&lookup, "STOREFRONT_SUCCESS_DISPLAY_MS")?
            .map_or(defaults.success_display, Duration::from_millis);

        let log_level = lookup("STOREFRONT_LOG_LEVEL")
            .filter(|level| !level.trim().is_empty())
            .unwrap_or(defaults.log_level);

        Ok(Self {
            api_url,
            request_timeout,
            success_display,
            log_level,
        })
    }
}

fn parse_u64<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| {
            value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                name,
                expected: "a non-negative integer",
                value,
            })
        })
        .transpose()
}
