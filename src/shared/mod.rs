//! Shared Module
//!
//! Wire types, configuration and the error taxonomy used across the client
//! core. Everything here is plain data with serde support.

/// Document, page and membership wire types
pub mod docs;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::{DocsError, DocsResult};
