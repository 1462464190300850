//! Error types for generation.

use thiserror::Error;
use tracegen_core::{ConfigError, SchemaError};

/// Errors raised before generation starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The generation bounds are invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The vocabulary schema cannot produce well-formed records.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;
