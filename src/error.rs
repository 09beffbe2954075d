//! Error types for Appshell
//!
//! All modules use `AppshellResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Appshell operations
pub type AppshellResult<T> = Result<T, AppshellError>;

/// All errors that can occur in Appshell
#[derive(Error, Debug)]
pub enum AppshellError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Cache store errors
    #[error("Cache store not found: {0}")]
    StoreNotFound(String),

    #[error("Pre-cache batch for generation '{generation}' failed: {} resource(s) could not be fetched: {}", .failed.len(), .failed.join(", "))]
    Precache {
        generation: String,
        failed: Vec<String>,
    },

    // Network errors
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Unsupported request method: {0}")]
    UnsupportedMethod(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppshellError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a fetch error
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error represents a transport-level network failure.
    ///
    /// Only transport failures trigger the network-first 503 substitute;
    /// HTTP error statuses are carried in successful responses and never
    /// reach this layer as errors.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}
