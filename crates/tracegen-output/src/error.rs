//! Error types for the output writers.

use thiserror::Error;

/// Errors raised while rendering or writing a table.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Writers refuse to render a table with no rows.
    #[error("table '{0}' has no rows to write")]
    EmptyInput(String),

    /// A row does not have the same columns as the first row.
    #[error("row {row} of table '{table}' does not match the header")]
    ShapeMismatch { table: String, row: usize },

    /// Writer configuration is unusable.
    #[error("invalid writer configuration: {0}")]
    InvalidConfig(String),

    /// Delimited input could not be parsed.
    #[error("malformed delimited input at line {line}: {message}")]
    Malformed { line: usize, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OutputError {
    /// Create an empty-input error.
    pub fn empty(table: impl Into<String>) -> Self {
        Self::EmptyInput(table.into())
    }

    /// Create a malformed-input error.
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;
