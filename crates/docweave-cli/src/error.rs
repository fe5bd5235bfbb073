// CLI error types

use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syntax configuration error: {0}")]
    Syntax(#[from] docweave_directives::SyntaxError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No model token prefix in '{0}'")]
    NoPrefix(String),
}

impl CliError {
    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!(
                    "Invalid argument: {}\n\nRun 'docweave --help' for usage information.",
                    message
                )
            }
            CliError::Io(e) => format!("File operation failed: {}", e),
            CliError::Syntax(e) => {
                format!("{}\n\nCheck the file passed with --syntax.", e)
            }
            CliError::Serialization(e) => format!("Could not render JSON output: {}", e),
            CliError::NoPrefix(reference) => format!(
                "'{}' is not a field reference; expected something like '$developers.Name'.",
                reference
            ),
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
