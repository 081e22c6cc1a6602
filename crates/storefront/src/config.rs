//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `BAZAAR_API_URL` - Base URL of the catalog REST API (default: `http://localhost:3000`)
//! - `BAZAAR_API_TOKEN` - Bearer token sent with every API request
//! - `BAZAAR_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `BAZAAR_SEED_PATH` - Use a local `db.json` file instead of the REST API
//! - `BAZAAR_SESSION_PATH` - Session file for cart and user (default: `.bazaar-session.json`)
//! - `BAZAAR_SUGGESTION_LIMIT` - Max inline search suggestions (default: 5)
//! - `BAZAAR_CURRENCY` - Display currency (default: `ARS`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use bazaar_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default inline suggestion cap.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_PATH: &str = ".bazaar-session.json";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Catalog REST API settings
    pub api: ApiConfig,
    /// Local `db.json` to use instead of the REST API
    pub seed_path: Option<PathBuf>,
    /// Session file holding the persisted cart and user
    pub session_path: PathBuf,
    /// Max inline search suggestions
    pub suggestion_limit: usize,
    /// Display currency for prices
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Catalog REST API settings.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL; `/products` and `/categories` are resolved under it
    pub base_url: Url,
    /// Bearer token, if the API requires one
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl StorefrontConfig {
    /// Configuration for an API at `base_url` with every other setting at its default.
    #[must_use]
    pub fn for_api(base_url: Url) -> Self {
        Self {
            api: ApiConfig {
                base_url,
                token: None,
                request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            },
            seed_path: None,
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            currency: CurrencyCode::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if the
    /// API token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url =
            parse_base_url(&get_env_or_default("BAZAAR_API_URL", "http://localhost:3000"))?;
        let token = match get_optional_env("BAZAAR_API_TOKEN") {
            Some(value) => {
                validate_secret_strength(&value, "BAZAAR_API_TOKEN")?;
                Some(SecretString::from(value))
            }
            None => None,
        };
        let timeout_secs = parse_env::<u64>(
            "BAZAAR_REQUEST_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )?;

        let suggestion_limit = parse_env::<usize>(
            "BAZAAR_SUGGESTION_LIMIT",
            &DEFAULT_SUGGESTION_LIMIT.to_string(),
        )?;
        let currency = get_env_or_default("BAZAAR_CURRENCY", "ARS")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_CURRENCY".to_string(), e))?;

        Ok(Self {
            api: ApiConfig {
                base_url,
                token,
                request_timeout: Duration::from_secs(timeout_secs),
            },
            seed_path: get_optional_env("BAZAAR_SEED_PATH").map(PathBuf::from),
            session_path: PathBuf::from(get_env_or_default(
                "BAZAAR_SESSION_PATH",
                DEFAULT_SESSION_PATH,
            )),
            suggestion_limit,
            currency,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the API base URL, accepting only http(s).
fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_API_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "BAZAAR_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Validate that a secret is not a placeholder.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
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
    fn test_parse_base_url() {
        assert!(parse_base_url("http://localhost:3000").is_ok());
        assert!(parse_base_url("https://api.example.com/v1").is_ok());
        assert!(matches!(
            parse_base_url("ftp://files.example.com"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-token-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("eyJhbGciOiJIUzI1NiJ9.k9Q2", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_for_api_defaults() {
        let config = StorefrontConfig::for_api(Url::parse("http://localhost:3000").unwrap());
        assert_eq!(config.suggestion_limit, DEFAULT_SUGGESTION_LIMIT);
        assert_eq!(config.api.request_timeout, Duration::from_secs(10));
        assert!(config.seed_path.is_none());
    }

    #[test]
    fn test_api_config_debug_redacts_token() {
        let config = ApiConfig {
            base_url: Url::parse("http://localhost:3000").unwrap(),
            token: Some(SecretString::from("super_secret_bearer")),
            request_timeout: Duration::from_secs(3),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("localhost:3000"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_bearer"));
    }
}
