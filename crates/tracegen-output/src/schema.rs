//! SQL `CREATE TABLE` output.

use std::path::Path;

use tracegen_core::{FieldRole, Record, TableSchema, Value};

use crate::error::{OutputError, Result};
use crate::file::write_atomic;
use crate::sql::quote_identifier;

/// One table to declare.
#[derive(Debug, Clone)]
pub struct TableDefinition<'a> {
    name: &'a str,
    schema: &'a TableSchema,
    sample: Option<&'a Record>,
    references: Option<(&'a str, &'a str)>,
}

impl<'a> TableDefinition<'a> {
    /// Declare `schema` as table `name`.
    pub fn new(name: &'a str, schema: &'a TableSchema) -> Self {
        Self {
            name,
            schema,
            sample: None,
            references: None,
        }
    }

    /// Infer sampled column types from a representative row.
    pub fn with_sample(mut self, sample: Option<&'a Record>) -> Self {
        self.sample = sample;
        self
    }

    /// Make the foreign-key column reference `table(column)`.
    pub fn references(mut self, table: &'a str, column: &'a str) -> Self {
        self.references = Some((table, column));
        self
    }
}

/// Renders `CREATE TABLE` statements from table schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaWriter;

impl SchemaWriter {
    pub fn new() -> Self {
        Self
    }

    /// Render one statement per table, in the given order.
    pub fn generate(&self, tables: &[TableDefinition<'_>]) -> Result<String> {
        let mut statements = Vec::with_capacity(tables.len());

        for table in tables {
            if table.schema.columns.is_empty() {
                return Err(OutputError::empty(table.name));
            }

            let mut lines = Vec::with_capacity(table.schema.columns.len());
            for field in &table.schema.columns {
                let column = quote_identifier(&field.display_name);
                let sample = table.sample.and_then(|r| r.get(&field.display_name));
                let definition = match field.role() {
                    FieldRole::PrimaryKey => format!("{} BIGINT PRIMARY KEY", column),
                    FieldRole::ForeignKey => match table.references {
                        Some((parent, key)) => format!(
                            "{} BIGINT NOT NULL REFERENCES {} ({})",
                            column,
                            quote_identifier(parent),
                            quote_identifier(key)
                        ),
                        None => format!("{} BIGINT NOT NULL", column),
                    },
                    FieldRole::EventAction => format!("{} TEXT NOT NULL", column),
                    FieldRole::EventDate => format!("{} TIMESTAMP(3) NOT NULL", column),
                    FieldRole::Sampled => format!("{} {}", column, column_type(sample)),
                };
                lines.push(format!("    {}", definition));
            }

            statements.push(format!(
                "CREATE TABLE {} (\n{}\n);",
                quote_identifier(table.name),
                lines.join(",\n")
            ));
        }

        Ok(statements.join("\n\n"))
    }

    /// Render and write atomically to `path`.
    pub fn write_to_file(&self, tables: &[TableDefinition<'_>], path: impl AsRef<Path>) -> Result<()> {
        let ddl = self.generate(tables)?;
        write_atomic(path, ddl.as_bytes())
    }
}

fn column_type(sample: Option<&Value>) -> &'static str {
    match sample {
        Some(Value::Integer(_)) => "BIGINT",
        Some(Value::Decimal(_)) => "DOUBLE PRECISION",
        Some(Value::Timestamp(_)) => "TIMESTAMP(3)",
        Some(Value::Text(_)) | Some(Value::Null) | None => "TEXT",
    }
}
