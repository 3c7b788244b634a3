//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MEDUSA_PUBLISHABLE_KEY` - Publishable API key for the store API
//!
//! ## Optional
//! - `MEDUSA_BACKEND_URL` - Base URL of the commerce backend
//!   (default: <http://localhost:9000>)
//! - `MOONJELLY_DATA_DIR` - Directory for durable key-value state
//!   (default: .moonjelly)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Placeholder value in {0}: {1}")]
    PlaceholderEnvVar(String, String),
}

/// Storefront client configuration.
///
/// The publishable key is a public token by design (mobile clients embed
/// it); customer auth tokens are obtained at runtime via login and never
/// pass through configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the commerce backend.
    pub backend_url: Url,
    /// Publishable API key sent with every store request.
    pub publishable_key: String,
    /// Directory for durable key-value state (cart id, region id, auth token).
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, the backend
    /// URL does not parse, or the publishable key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend_url = get_env_or_default("MEDUSA_BACKEND_URL", "http://localhost:9000")
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MEDUSA_BACKEND_URL".to_string(), e.to_string())
            })?;

        let publishable_key = get_required_env("MEDUSA_PUBLISHABLE_KEY")?;
        validate_not_placeholder(&publishable_key, "MEDUSA_PUBLISHABLE_KEY")?;

        let data_dir = PathBuf::from(get_env_or_default("MOONJELLY_DATA_DIR", ".moonjelly"));

        Ok(Self {
            backend_url,
            publishable_key,
            data_dir,
        })
    }

    /// Path of the JSON file backing the durable key-value store.
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a key is not an obvious placeholder left in an env file.
fn validate_not_placeholder(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::PlaceholderEnvVar(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_placeholder_accepts_real_key() {
        assert!(validate_not_placeholder("pk_9f2c4d1ab37e", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_not_placeholder_rejects_template_values() {
        for value in ["your-key-here", "CHANGEME", "pk_example_123", "todo-fill-in"] {
            let result = validate_not_placeholder(value, "TEST_VAR");
            assert!(matches!(result, Err(ConfigError::PlaceholderEnvVar(_, _))), "{value}");
        }
    }

    #[test]
    fn test_state_file_is_under_data_dir() {
        let config = Config {
            backend_url: "http://localhost:9000".parse().unwrap(),
            publishable_key: "pk_9f2c4d1ab37e".to_string(),
            data_dir: PathBuf::from("/tmp/mj-data"),
        };
        assert_eq!(config.state_file(), PathBuf::from("/tmp/mj-data/state.json"));
    }
}
