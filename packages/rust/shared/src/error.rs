//! Error types for Ementário.
//!
//! Library crates use [`EmentarioError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Failure scoping follows the harvest design: nothing in this taxonomy is
//! allowed to abort a multi-section run. `MalformedRecord` is recovered per
//! card, `ExtractionTimeout` is retried once then counted, and
//! `SourceAdvance` ends only the current section.

use std::path::PathBuf;

/// Top-level error type for all Ementário operations.
#[derive(Debug, thiserror::Error)]
pub enum EmentarioError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to the record source.
    #[error("source error: {0}")]
    Source(String),

    /// A card yielded no usable process key and no usable body.
    #[error("malformed record: {message}")]
    MalformedRecord { message: String },

    /// A record body copy/extraction did not complete in time.
    #[error("extraction timed out: {0}")]
    ExtractionTimeout(String),

    /// The source could not advance to the next page. Terminal for the
    /// current section only.
    #[error("source advance failed: {0}")]
    SourceAdvance(String),

    /// HTML or text parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (empty plan, bad flag combination, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EmentarioError>;

impl EmentarioError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a malformed-record error from any displayable message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = EmentarioError::config("missing output path");
        assert_eq!(err.to_string(), "config error: missing output path");

        let err = EmentarioError::malformed("no process key and empty body");
        assert!(err.to_string().contains("no process key"));

        let err = EmentarioError::SourceAdvance("next-page control not found".into());
        assert!(err.to_string().contains("advance"));
    }
}
