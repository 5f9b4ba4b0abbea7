//! Configuration Module
//!
//! Handles loading and managing client configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{DEFAULT_COOKIE_PREFIX, MAX_COOKIE_SIZE};

/// Default API endpoint used when `API_BASE_URL` is unset
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Client configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL relative paths are resolved against
    pub base_url: String,
    /// Wall-clock limit for a single HTTP request
    pub request_timeout: Duration,
    /// Background sweep interval for both cache tiers
    pub cleanup_interval: Duration,
    /// Namespace prefix for cache cookies
    pub cookie_prefix: String,
    /// Maximum serialized cookie payload in bytes
    pub cookie_max_size: usize,
    /// When set, cookies persist to this JSON file
    pub cookie_store_path: Option<PathBuf>,
    /// When set, the auth token persists to this file
    pub token_path: Option<PathBuf>,
    /// Login entry point reported when the server answers 401
    pub login_url: String,
    /// Headers attached to every request
    pub default_headers: Vec<(String, String)>,
}

impl ClientConfig {
    /// Creates a new ClientConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `API_BASE_URL` - API base URL (default: http://localhost:5000/api)
    /// - `REQUEST_TIMEOUT_MS` - Request timeout in milliseconds (default: 10000)
    /// - `CACHE_CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 600)
    /// - `CACHE_COOKIE_PREFIX` - Cookie namespace (default: jb_cache_)
    /// - `CACHE_COOKIE_MAX_SIZE` - Cookie payload cap in bytes (default: 4000)
    /// - `CACHE_COOKIE_FILE` - Optional cookie persistence file
    /// - `AUTH_TOKEN_FILE` - Optional token persistence file
    /// - `LOGIN_URL` - Login entry point (default: /login)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            base_url: env::var("API_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            cleanup_interval: env::var("CACHE_CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
            cookie_prefix: env::var("CACHE_COOKIE_PREFIX").unwrap_or(defaults.cookie_prefix),
            cookie_max_size: env::var("CACHE_COOKIE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cookie_max_size),
            cookie_store_path: env::var("CACHE_COOKIE_FILE").ok().map(PathBuf::from),
            token_path: env::var("AUTH_TOKEN_FILE").ok().map(PathBuf::from),
            login_url: env::var("LOGIN_URL").unwrap_or(defaults.login_url),
            default_headers: defaults.default_headers,
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the cookie payload cap.
    pub fn with_cookie_max_size(mut self, size: usize) -> Self {
        self.cookie_max_size = size;
        self
    }

    /// Sets the cleanup interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(10_000),
            cleanup_interval: Duration::from_secs(600),
            cookie_prefix: DEFAULT_COOKIE_PREFIX.to_string(),
            cookie_max_size: MAX_COOKIE_SIZE,
            cookie_store_path: None,
            token_path: None,
            login_url: "/login".to_string(),
            default_headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.cleanup_interval, Duration::from_secs(600));
        assert_eq!(config.cookie_max_size, 4000);
        assert!(config.cookie_store_path.is_none());
        assert_eq!(config.default_headers.len(), 2);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("API_BASE_URL");
        env::remove_var("REQUEST_TIMEOUT_MS");
        env::remove_var("CACHE_CLEANUP_INTERVAL");
        env::remove_var("CACHE_COOKIE_MAX_SIZE");
        env::remove_var("CACHE_COOKIE_FILE");

        let config = ClientConfig::from_env();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_millis(10_000));
        assert_eq!(config.cookie_max_size, MAX_COOKIE_SIZE);
        assert!(config.cookie_store_path.is_none());
    }

    #[test]
    fn test_config_builders() {
        let config = ClientConfig::default()
            .with_base_url("http://api.test")
            .with_request_timeout(Duration::from_millis(250))
            .with_cookie_max_size(128);

        assert_eq!(config.base_url, "http://api.test");
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.cookie_max_size, 128);
    }
}
