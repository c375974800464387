//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `KIDSGPT_API_URL` - Backend API base URL including the `/api` prefix
//!   (default: `http://localhost:8000/api`)
//! - `KIDSGPT_STATE_DIR` - Directory for device-local session state
//!   (default: `$HOME/.kidsgpt`)
//! - `KIDSGPT_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_STATE_DIR: &str = ".kidsgpt";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API base URL, including the `/api` prefix.
    pub api_url: Url,
    /// Directory holding device-local session state.
    pub state_dir: PathBuf,
    /// Timeout applied to every HTTP request.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present. Every
    /// variable has a default, so this only fails on malformed values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `KIDSGPT_API_URL` is not a valid URL or
    /// `KIDSGPT_HTTP_TIMEOUT_SECS` is not an integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_env_or_default("KIDSGPT_API_URL", DEFAULT_API_URL)
            .parse::<Url>()
            .map_err(|e| ConfigError::InvalidEnvVar("KIDSGPT_API_URL".to_string(), e.to_string()))?;

        let state_dir = std::env::var_os("KIDSGPT_STATE_DIR")
            .map_or_else(default_state_dir, PathBuf::from);

        let timeout_secs = get_env_or_default(
            "KIDSGPT_HTTP_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("KIDSGPT_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_url,
            state_dir,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Build a configuration directly, for tests and embedders.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_url` is not a valid URL.
    pub fn new(api_url: &str, state_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: api_url
                .parse::<Url>()
                .map_err(|e| ConfigError::InvalidEnvVar("api_url".to_string(), e.to_string()))?,
            state_dir: state_dir.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// `$HOME/.kidsgpt`, or `./.kidsgpt` when `$HOME` is unset.
fn default_state_dir() -> PathBuf {
    std::env::var_os("HOME").map_or_else(
        || PathBuf::from(DEFAULT_STATE_DIR),
        |home| PathBuf::from(home).join(DEFAULT_STATE_DIR),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid_url() {
        let config = ClientConfig::new("http://localhost:8000/api", "/tmp/state").unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/api");
        assert_eq!(config.state_dir, PathBuf::from("/tmp/state"));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_new_invalid_url() {
        let result = ClientConfig::new("not a url", "/tmp/state");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_default_state_dir_ends_with_kidsgpt() {
        assert!(default_state_dir().ends_with(".kidsgpt"));
    }
}
