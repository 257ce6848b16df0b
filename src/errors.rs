//! Shared error types for evalmap.
//!
//! The analysis engine itself never fails: sparse or missing data degrades to
//! `None` statistics with a reason string. Errors are reserved for caller
//! contract violations (malformed input shape) and for configuration or I/O
//! problems at the edges.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for evalmap operations
#[derive(Debug, Error)]
pub enum Error {
    /// Input does not have the shape the engine requires
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// File system related errors
    #[error("File system error: {message}")]
    FileSystem {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// An inner error with context prepended
    #[error("{context}: {error}")]
    WithContext { context: String, error: Box<Error> },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a file system error with path context
    pub fn file_system(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: Some(path.into()),
            source: Some(source),
        }
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            error: Box::new(self),
        }
    }

    /// Whether the caller can fix this error by changing their input
    pub fn is_user_fixable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Configuration(_) | Self::Json(_) | Self::Toml(_) => true,
            Self::WithContext { error, .. } => error.is_user_fixable(),
            Self::FileSystem { .. } | Self::Io(_) => false,
        }
    }

    /// What to change, for errors the user can fix
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::WithContext { error, .. } => error.hint(),
            Self::Validation(_) | Self::Json(_) => {
                Some("the export must be a JSON array of papers or an object with a `papers` array")
            }
            Self::Configuration(_) | Self::Toml(_) => {
                Some("fix the configuration file or run `evalmap init --force` to regenerate it")
            }
            Self::FileSystem { .. } | Self::Io(_) => None,
        }
    }
}

/// First user-fixable evalmap error in an `anyhow` cause chain
pub fn user_fixable_cause(err: &anyhow::Error) -> Option<&Error> {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<Error>())
        .find(|error| error.is_user_fixable())
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}
