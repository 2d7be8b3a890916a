//! Error types for omnisift.
//!
//! Errors only travel *inside* the pipeline. Every public boundary operation
//! (detection, processor extraction, registry dispatch, metadata extraction)
//! turns them into a result object that carries success or failure, so callers
//! never need an error handler around the core. Wiring-time operations
//! (registry lifecycle, configuration loading) return `Result` directly.
//!
//! - `OmnisiftError::Io` (from `std::io::Error`) bubbles up unchanged
//! - Application errors carry a message and an optional source
//!
//! # Example
//!
//! ```rust
//! use omnisift::{OmnisiftError, Result};
//!
//! fn read_sample(path: &str) -> Result<Vec<u8>> {
//!     let bytes = std::fs::read(path)?;
//!     if bytes.is_empty() {
//!         return Err(OmnisiftError::validation(format!("File is empty: {}", path)));
//!     }
//!     Ok(bytes)
//! }
//! ```
use crate::types::ContentType;
use thiserror::Error;

/// Result type alias using `OmnisiftError`.
pub type Result<T> = std::result::Result<T, OmnisiftError>;

/// Main error type for all omnisift operations.
#[derive(Debug, Error)]
pub enum OmnisiftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parsing error: {message}")]
    Parsing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failure reported by an external extraction engine (OCR, speech, PDF, office).
    #[error("Engine error: {message}")]
    Engine {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Plugin error in '{plugin_name}': {message}")]
    Plugin { message: String, plugin_name: String },

    #[error("{operation} of '{plugin_name}' timed out")]
    Timeout { operation: String, plugin_name: String },

    #[error("{0} content type is not supported")]
    UnsupportedContentType(ContentType),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for OmnisiftError {
    fn from(err: serde_json::Error) -> Self {
        OmnisiftError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<tokio::task::JoinError> for OmnisiftError {
    fn from(err: tokio::task::JoinError) -> Self {
        OmnisiftError::Other(format!("Background task failed: {}", err))
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl OmnisiftError {
    error_constructor!(parsing, Parsing);
    error_constructor!(validation, Validation);
    error_constructor!(engine, Engine);
    error_constructor!(serialization, Serialization);

    /// Create a plugin error attributed to `plugin_name`.
    pub fn plugin<S: Into<String>, N: Into<String>>(plugin_name: N, message: S) -> Self {
        Self::Plugin {
            message: message.into(),
            plugin_name: plugin_name.into(),
        }
    }
}
