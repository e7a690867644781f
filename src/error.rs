//! Error types for the configuration cascade.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, parsing or editing configuration files.
///
/// Only [`CascadeError::UnbalancedContext`] escapes [`crate::loader::Loader::load`];
/// everything else is recovered per file and surfaced through logs and the report.
#[derive(Debug, Error)]
pub enum CascadeError {
    /// `pop()` was called on the dependency tracker with nothing pushed.
    #[error("unbalanced push/pop on dependency context stack")]
    UnbalancedContext,

    /// No parser is registered for the requested format.
    #[error("no parser for format '{format}' ({})", path.display())]
    UnknownFormat { format: String, path: PathBuf },

    /// Structured content could not be decoded into a mapping.
    #[error("failed to decode {format} document: {message}")]
    Decode { format: String, message: String },

    /// A configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An include target failed the path safety check.
    #[error("invalid include '{path}': {reason}")]
    InvalidInclude { path: String, reason: String },
}

impl CascadeError {
    pub fn unknown_format(format: &str, path: impl Into<PathBuf>) -> Self {
        Self::UnknownFormat {
            format: format.to_string(),
            path: path.into(),
        }
    }

    pub fn decode(format: &str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            format: format.to_string(),
            message: err.to_string(),
        }
    }

    pub fn invalid_include(path: &str, reason: &str) -> Self {
        Self::InvalidInclude {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error indicates a caller defect rather than bad input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnbalancedContext)
    }
}

/// Result type for cascade operations.
pub type Result<T> = std::result::Result<T, CascadeError>;
