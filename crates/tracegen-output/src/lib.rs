//! # tracegen-output
//!
//! Writers for generated tables:
//!
//! - [`SqlInsertWriter`]: batched multi-row `INSERT` statements
//! - [`DelimitedWriter`]: delimited text with a header row, internal
//!   columns omitted ([`DelimitedReader`] parses it back)
//! - [`SchemaWriter`]: `CREATE TABLE` statements derived from field roles
//!
//! Every writer renders to a `String` first; `write_to_file` then goes
//! through [`write_atomic`], so a failed run never leaves a partial file at
//! the target path.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tracegen_output::{DelimitedWriter, SqlInsertWriter};
//!
//! SqlInsertWriter::new()
//!     .with_batch_size(500)
//!     .write_to_file("events", &events, "out/sql/events.sql")?;
//! DelimitedWriter::new().write_to_file("events", &events, "out/csv/events.csv")?;
//! ```

pub mod delimited;
pub mod error;
pub mod file;
pub mod schema;
pub mod sql;
pub mod table;

pub use delimited::{DelimitedReader, DelimitedWriter};
pub use error::{OutputError, Result};
pub use file::write_atomic;
pub use schema::{SchemaWriter, TableDefinition};
pub use sql::{quote_identifier, sql_literal, SqlInsertWriter};
pub use table::Row;
