//! Error types for engine syntax loading
//!
//! Classification, synthesis and extraction never fail; only building an
//! [`EngineSyntax`](crate::syntax::EngineSyntax) from external input can.

use thiserror::Error;

/// Result type for syntax loading and validation
pub type Result<T> = std::result::Result<T, SyntaxError>;

/// Errors raised while loading or validating an engine syntax
#[derive(Debug, Error)]
pub enum SyntaxError {
    /// IO error while reading a syntax file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The syntax document could not be deserialized
    #[error("Failed to parse {format} syntax: {message}")]
    Parse {
        /// Format that was being parsed (yaml, toml, json)
        format: &'static str,
        /// Underlying parser message
        message: String,
    },

    /// File extension does not map to a known format
    #[error("Unsupported syntax file format: {0}")]
    UnsupportedFormat(String),

    /// The syntax loaded but cannot drive the scanner or synthesizer
    #[error("Invalid engine syntax: {0}")]
    Invalid(String),
}

impl SyntaxError {
    pub(crate) fn parse(format: &'static str, err: impl std::fmt::Display) -> Self {
        SyntaxError::Parse {
            format,
            message: err.to_string(),
        }
    }
}
