//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CHATSHOP_API_URL` - Catalog backend base URL (default: `http://localhost:8000`)
//! - `CHATSHOP_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `CHATSHOP_MAX_GENERAL_IMAGES` - Staged general images allowed per edit session (default: 10)
//! - `CHATSHOP_LOG_FORMAT` - `text` or `json` (default: `text`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_GENERAL_IMAGES: usize = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'text' or 'json', got '{other}'")),
        }
    }
}

/// Admin client configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Catalog backend base URL, without trailing slash
    pub api_url: String,
    /// Timeout applied to every backend request
    pub http_timeout: Duration,
    /// Maximum number of general images that can be staged in one session
    pub max_general_images: usize,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_general_images: DEFAULT_MAX_GENERAL_IMAGES,
            log_format: LogFormat::Text,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// The caller is responsible for loading a `.env` file beforehand.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = validate_api_url(
            "CHATSHOP_API_URL",
            &get("CHATSHOP_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        )?;

        let http_timeout = get("CHATSHOP_HTTP_TIMEOUT_SECS")
            .map(|v| parse_var::<u64>("CHATSHOP_HTTP_TIMEOUT_SECS", &v))
            .transpose()?
            .map_or(
                Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
                Duration::from_secs,
            );

        let max_general_images = get("CHATSHOP_MAX_GENERAL_IMAGES")
            .map(|v| parse_var::<usize>("CHATSHOP_MAX_GENERAL_IMAGES", &v))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_GENERAL_IMAGES);

        let log_format = get("CHATSHOP_LOG_FORMAT")
            .map(|v| {
                v.parse::<LogFormat>()
                    .map_err(|e| ConfigError::InvalidEnvVar("CHATSHOP_LOG_FORMAT".to_string(), e))
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            api_url,
            http_timeout,
            max_general_images,
            log_format,
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a numeric variable, naming it in the error.
fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Check that the backend URL is absolute http(s) and strip the trailing slash.
fn validate_api_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}
