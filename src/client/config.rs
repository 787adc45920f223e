use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};
use std::time::Duration;

/// Default server URL
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Client configuration wrapper.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
    token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut builder = AppConfig::builder().server_url(
            std::env::var("CLIENT_API_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string()),
        );
        if let Some(secs) = env_number::<u64>("CLIENT_REQUEST_TIMEOUT_SECS") {
            builder = builder.request_timeout_secs(secs);
        }
        if let Some(limit) = env_number::<i64>("DOCS_PAGE_LIMIT") {
            builder = builder.page_limit(limit);
        }
        let app = builder.build().unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid client environment ({}), using defaults", e);
            AppConfig {
                server_url: Some(DEFAULT_SERVER_URL.to_string()),
                ..AppConfig::default()
            }
        });
        Self { app, token: None }
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring non-numeric {}={:?}", key, raw);
            None
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        let app = builder.build()?;
        Ok(Self { app, token: None })
    }

    pub fn from_app_config(app: AppConfig) -> Result<Self, ConfigError> {
        app.validate()?;
        Ok(Self { app, token: None })
    }

    /// Set the bearer token
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Get the bearer token
    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    /// Clear the token (logout)
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url(), path)
    }

    pub fn server_url(&self) -> &str {
        self.app.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.app.request_timeout_secs)
    }

    /// Documents per catalog page
    pub fn page_limit(&self) -> i64 {
        self.app.page_limit
    }
}
