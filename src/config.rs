//! Configuration for the Rain or Shine client

use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Environment variable holding the backend base URL.
pub const API_URL_ENV: &str = "RAIN_OR_SHINE_API_URL";

/// Validated connection settings for the Rain or Shine backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
}

impl ClientConfig {
    /// Creates a new configuration, validating the base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url).map_err(|e| Error::config(format!("invalid base URL: {}", e)))?;

        if !url.has_host() {
            return Err(Error::config("base URL must include a host"));
        }

        Ok(Self { base_url: url })
    }

    /// Attempts to create configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(API_URL_ENV)
            .map_err(|_| Error::config(format!("{} environment variable not found", API_URL_ENV)))?;

        Self::new(&base_url)
    }

    /// The backend base URL without a trailing slash.
    pub fn base(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_string()
    }
}

/// Configuration options for the Rain or Shine client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Where the backend should send the browser once the OAuth round trip
    /// completes; `None` lets the backend apply its configured default
    pub redirect_uri: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            redirect_uri: None,
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the post-authorization redirect target
    pub fn with_redirect_uri(mut self, value: &str) -> Self {
        self.redirect_uri = Some(value.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_strips_trailing_slash() {
        let config = ClientConfig::new("https://rainorshine.example.com/").unwrap();
        assert_eq!(config.base(), "https://rainorshine.example.com");
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert!(ClientConfig::new("not a url").is_err());
    }

    #[test]
    fn test_options_builder() {
        let options = ClientOptions::default()
            .with_request_timeout(None)
            .with_redirect_uri("https://app.example.com/dashboard");

        assert!(options.request_timeout.is_none());
        assert_eq!(
            options.redirect_uri.as_deref(),
            Some("https://app.example.com/dashboard")
        );
    }
}
