//! Error types for structural validation.
//!
//! Both error kinds are raised synchronously, before any generation work
//! starts. Nothing is ever partially generated because of them.

use thiserror::Error;

use crate::schema::TableKind;

/// Invalid generation bounds or run parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A `[min, max]` pair is inverted.
    #[error("invalid range for {name}: min {min} is greater than max {max}")]
    InvertedRange { name: &'static str, min: u64, max: u64 },

    /// A parameter that must be strictly positive is zero.
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    /// Any other invalid value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A vocabulary schema that cannot produce well-formed records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No field carries a role the table requires.
    #[error("{table} schema has no {role} field")]
    MissingRole { table: TableKind, role: &'static str },

    /// More than one field carries a role that must be unique.
    #[error("{table} schema has more than one {role} field")]
    DuplicateRole { table: TableKind, role: &'static str },

    /// A sampled field has no value source behind it.
    #[error("{table} field '{field}' has no value source for key '{key}'")]
    UnknownKey {
        table: TableKind,
        field: String,
        key: String,
    },

    /// The start or end marker is unusable.
    #[error("invalid marker: {0}")]
    InvalidMarker(String),

    /// The vocabulary document itself is malformed.
    #[error("malformed vocabulary: {0}")]
    Malformed(String),
}

impl ConfigError {
    /// Creates a new inverted range error.
    pub fn inverted(name: &'static str, min: impl Into<u64>, max: impl Into<u64>) -> Self {
        Self::InvertedRange {
            name,
            min: min.into(),
            max: max.into(),
        }
    }

    /// Creates a new generic invalid configuration error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

impl SchemaError {
    /// Creates a new missing role error.
    pub fn missing(table: TableKind, role: &'static str) -> Self {
        Self::MissingRole { table, role }
    }

    /// Creates a new duplicate role error.
    pub fn duplicate(table: TableKind, role: &'static str) -> Self {
        Self::DuplicateRole { table, role }
    }

    /// Creates a new unknown sampling key error.
    pub fn unknown_key(table: TableKind, field: impl Into<String>, key: impl Into<String>) -> Self {
        Self::UnknownKey {
            table,
            field: field.into(),
            key: key.into(),
        }
    }

    /// Creates a new malformed vocabulary error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
