//! Application configuration module
//!
//! Provides configuration types for the document client. Values can come from
//! the builder, from a TOML document, or (in `client::Config`) from environment
//! variables.

use serde::Deserialize;
use thiserror::Error;

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default number of documents per catalog page
pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Largest catalog page the service will serve
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server URL
    pub server_url: Option<String>,
    /// Per-request timeout for the document service
    pub request_timeout_secs: u64,
    /// Documents per catalog page
    pub page_limit: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse and validate a TOML document such as:
    ///
    /// ```toml
    /// server_url = "https://docs.example.com"
    /// request_timeout_secs = 5
    /// page_limit = 50
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.server_url {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.to_string()));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&self.page_limit) {
            return Err(ConfigError::InvalidValue {
                key: "page_limit",
                message: format!("must be between 1 and {}", MAX_PAGE_LIMIT),
            });
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
    page_limit: Option<i64>,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.server_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    pub fn page_limit(mut self, limit: i64) -> Self {
        self.page_limit = Some(limit);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            server_url: self.server_url,
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            page_limit: self.page_limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}
