//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `NUMA_IDENTITY_URL` - Base URL of the remote identity provider
//! - `NUMA_IDENTITY_API_KEY` - Identity provider API key
//! - `NUMA_STORE_URL` - Base URL of the remote collection store
//!
//! ## Optional
//! - `NUMA_HOST` - Bind address (default: 127.0.0.1)
//! - `NUMA_PORT` - Listen port (default: 3000)
//! - `NUMA_SESSION_CACHE_PATH` - Local session cache file
//!   (default: .numa/numa-user.json)
//! - `NUMA_CONTENT_API_KEY` - Content-generation API key
//! - `NUMA_STOCK_IMAGE_API_KEY` - Stock image API key
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! The two content keys are only handed to outward-facing tooling; their
//! absence never prevents the service from starting.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default location of the cached session record.
const DEFAULT_SESSION_CACHE_PATH: &str = ".numa/numa-user.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct NumaConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Remote identity provider configuration
    pub identity: IdentityConfig,
    /// Remote collection store configuration
    pub store: StoreConfig,
    /// Path of the local session cache file
    pub session_cache_path: PathBuf,
    /// Optional external content API keys
    pub content: ContentConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Remote identity provider configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Base URL of the identity provider API
    pub base_url: Url,
    /// API key sent with every provider request
    pub api_key: SecretString,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Remote collection store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the document store API
    pub base_url: Url,
}

/// External content API keys.
///
/// Both keys are optional: the reconciler and store components never
/// depend on them. Implements `Debug` manually to redact values.
#[derive(Clone, Default)]
pub struct ContentConfig {
    /// Content-generation API key
    pub content_api_key: Option<SecretString>,
    /// Stock image API key
    pub stock_image_api_key: Option<SecretString>,
}

impl std::fmt::Debug for ContentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentConfig")
            .field("content_api_key", &self.content_api_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "stock_image_api_key",
                &self.stock_image_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl NumaConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("NUMA_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("NUMA_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("NUMA_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("NUMA_PORT".to_string(), e.to_string()))?;

        let identity = IdentityConfig {
            base_url: get_required_url("NUMA_IDENTITY_URL")?,
            api_key: get_required_secret("NUMA_IDENTITY_API_KEY")?,
        };
        let store = StoreConfig {
            base_url: get_required_url("NUMA_STORE_URL")?,
        };

        let session_cache_path =
            PathBuf::from(get_env_or_default("NUMA_SESSION_CACHE_PATH", DEFAULT_SESSION_CACHE_PATH));

        let content = ContentConfig {
            content_api_key: get_optional_env("NUMA_CONTENT_API_KEY").map(SecretString::from),
            stock_image_api_key: get_optional_env("NUMA_STOCK_IMAGE_API_KEY").map(SecretString::from),
        };

        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            identity,
            store,
            session_cache_path,
            content,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get a required environment variable parsed as a URL.
fn get_required_url(key: &str) -> Result<Url, ConfigError> {
    let value = get_required_env(key)?;
    Url::parse(&value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> NumaConfig {
        NumaConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            identity: IdentityConfig {
                base_url: Url::parse("https://identity.example.com").unwrap(),
                api_key: SecretString::from("k-3fj29skd"),
            },
            store: StoreConfig {
                base_url: Url::parse("https://store.example.com").unwrap(),
            },
            session_cache_path: PathBuf::from(DEFAULT_SESSION_CACHE_PATH),
            content: ContentConfig::default(),
            sentry_dsn: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_identity_config_debug_redacts_api_key() {
        let config = test_config();
        let debug_output = format!("{:?}", config.identity);

        assert!(debug_output.contains("identity.example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("k-3fj29skd"));
    }

    #[test]
    fn test_content_config_debug_redacts_keys() {
        let content = ContentConfig {
            content_api_key: Some(SecretString::from("content-secret-key")),
            stock_image_api_key: None,
        };
        let debug_output = format!("{content:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("content-secret-key"));
    }
}
