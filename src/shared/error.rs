//! Shared Error Types
//!
//! This module defines the error taxonomy used by every document operation,
//! whether the failure was detected locally or reported by the document service.
//!
//! # Error Categories
//!
//! - `Validation` - bad input, caught before any service call
//! - `NotMember` - the viewer may not edit the document (distinct UI state)
//! - `Forbidden` - owner-only action attempted by a non-owner
//! - `Conflict` - duplicate join request / already a member
//! - `NotFound` - document, page or request vanished
//! - `TransientServiceError` - network, timeout or 5xx
//! - `MalformedPayload` - page payload that is not valid base64 / UTF-8
//! - `Serialization` - response body that could not be decoded
//!
//! # Usage
//!
//! ```rust
//! use pagedocs::shared::error::DocsError;
//!
//! let error = DocsError::validation("title", "document title cannot be empty");
//! assert!(error.is_validation());
//! ```
//!
//! Errors are `Clone` so they can be stored on the page or document state that
//! failed and still be returned to the caller.
use thiserror::Error;

/// Result alias used throughout the crate
pub type DocsResult<T> = Result<T, DocsError>;

/// Errors produced by the document client core
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocsError {
    /// Input rejected locally (or by the service's own validation)
    #[error("Validation error in field '{field}': {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// The viewer is not an owner or editor of the document
    #[error("not an editor of this document")]
    NotMember,

    /// Owner-only action, or an action that may never be taken
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Human-readable error message
        message: String,
    },

    /// State conflict on the service side
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable error message
        message: String,
    },

    /// The addressed entity does not exist (any more)
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message
        message: String,
    },

    /// Network failure, timeout or server-side fault
    #[error("Service unavailable: {message}")]
    TransientServiceError {
        /// Human-readable error message
        message: String,
    },

    /// Page payload that could not be decoded
    #[error("Malformed payload: {message}")]
    MalformedPayload {
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
    },
}

impl DocsError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientServiceError {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_not_member(&self) -> bool {
        matches!(self, Self::NotMember)
    }

    /// Whether re-triggering the same operation later may succeed.
    ///
    /// Nothing is retried automatically; the rendering layer uses this to decide
    /// whether to offer a "try again" affordance.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientServiceError { .. })
    }
}

impl From<serde_json::Error> for DocsError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

impl From<base64::DecodeError> for DocsError {
    fn from(err: base64::DecodeError) -> Self {
        Self::malformed(format!("invalid base64: {}", err))
    }
}

impl From<std::string::FromUtf8Error> for DocsError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::malformed(format!("invalid UTF-8: {}", err))
    }
}

impl From<reqwest::Error> for DocsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::serialization(format!("Failed to parse response: {}", err))
        } else if err.is_timeout() {
            Self::transient(format!("Request timed out: {}", err))
        } else {
            Self::transient(format!("Network error: {}", err))
        }
    }
}
