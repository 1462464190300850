//! Tracegen Core - Core types for the process-mining dataset generator.
//!
//! This crate provides the fundamental types shared by every stage of a
//! generation run:
//!
//! - [`ids`]: Identifier newtypes (`CaseId`, `EventId`, `ShardId`, `RunId`)
//! - [`value`]: Scalar values and ordered records
//! - [`schema`]: Table schemas and field roles
//! - [`record`]: Case and event records
//! - [`config`]: Generation bounds and their validation
//! - [`error`]: Structural error types
//!
//! # Example
//!
//! ```
//! use tracegen_core::{GenerationConfig, Record, Value};
//!
//! let config = GenerationConfig::default();
//! assert!(config.validate().is_ok());
//!
//! let mut record = Record::new();
//! record.push("Case ID", Value::Integer(1));
//! assert_eq!(record.get("Case ID"), Some(&Value::Integer(1)));
//! ```

pub mod config;
pub mod error;
pub mod ids;
pub mod record;
pub mod schema;
pub mod value;

pub use config::GenerationConfig;
pub use error::{ConfigError, SchemaError};
pub use ids::{CaseId, EventId, RunId, ShardId};
pub use record::{CaseRecord, EventRecord};
pub use schema::{is_internal_column, FieldRole, FieldSpec, TableKind, TableSchema, INTERNAL_FIELD_MARKER};
pub use value::{Record, Value, TIMESTAMP_FORMAT};
