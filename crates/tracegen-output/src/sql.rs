//! Batched SQL `INSERT` output.

use std::path::Path;

use tracegen_core::Value;
use tracing::instrument;

use crate::error::{OutputError, Result};
use crate::file::write_atomic;
use crate::table::{header, Row};

#[derive(Debug, Clone)]
struct SqlInsertConfig {
    /// Rows per `INSERT` statement (default: 1000).
    pub batch_size: usize,
}

impl Default for SqlInsertConfig {
    fn default() -> Self {
        Self { batch_size: 1000 }
    }
}

/// Renders a table as a sequence of multi-row `INSERT` statements.
#[derive(Debug, Clone, Default)]
pub struct SqlInsertWriter {
    config: SqlInsertConfig,
}

impl SqlInsertWriter {
    /// Create a writer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of rows per statement.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Render `rows` into `table`.
    ///
    /// One statement per `batch_size` rows, statements separated by a
    /// newline. Text and timestamps are single-quoted, nulls are `NULL` and
    /// numbers are written verbatim.
    #[instrument(skip(self, rows), fields(table = %table, rows = rows.len()))]
    pub fn generate<R: Row>(&self, table: &str, rows: &[R]) -> Result<String> {
        if self.config.batch_size == 0 {
            return Err(OutputError::InvalidConfig("batch size must be positive".into()));
        }
        let columns = header(table, rows)?;
        let column_list = columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");

        let statements: Vec<String> = rows
            .chunks(self.config.batch_size)
            .map(|batch| {
                let value_sets: Vec<String> = batch
                    .iter()
                    .map(|row| {
                        let values: Vec<String> = row.record().values().map(sql_literal).collect();
                        format!("({})\n", values.join(", "))
                    })
                    .collect();
                format!(
                    "INSERT INTO {} ({})\n VALUES {};",
                    quote_identifier(table),
                    column_list,
                    value_sets.join(", ")
                )
            })
            .collect();

        Ok(statements.join("\n"))
    }

    /// Render `rows` and write them atomically to `path`.
    pub fn write_to_file<R: Row>(&self, table: &str, rows: &[R], path: impl AsRef<Path>) -> Result<()> {
        let sql = self.generate(table, rows)?;
        write_atomic(path, sql.as_bytes())
    }
}

/// Render a value as a SQL literal.
pub fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        textual if textual.is_textual() => format!("'{}'", textual.to_string().replace('\'', "''")),
        other => other.to_string(),
    }
}

/// Double-quote an identifier unless it is a plain word.
pub fn quote_identifier(name: &str) -> String {
    let plain = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tracegen_core::Record;

    fn rows(n: i64) -> Vec<Record> {
        (1..=n)
            .map(|i| {
                let mut record = Record::new();
                record.push("id", i);
                record.push("name", format!("case-{}", i));
                record
            })
            .collect()
    }

    #[test]
    fn test_single_statement_layout() {
        let sql = SqlInsertWriter::new().generate("cases", &rows(2)).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO cases (id, name)\n VALUES (1, 'case-1')\n, (2, 'case-2')\n;"
        );
    }

    #[test]
    fn test_batching() {
        let sql = SqlInsertWriter::new()
            .with_batch_size(2)
            .generate("cases", &rows(5))
            .unwrap();

        assert_eq!(sql.matches("INSERT INTO").count(), 3);
        let last = sql.rsplit("INSERT INTO").next().unwrap();
        assert!(last.contains("(5, 'case-5')"));
        assert!(!last.contains("case-4"));
    }

    #[test]
    fn test_literals() {
        let ts = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_milli_opt(8, 5, 3, 7)
            .unwrap();

        assert_eq!(sql_literal(&Value::Null), "NULL");
        assert_eq!(sql_literal(&Value::Integer(-4)), "-4");
        assert_eq!(sql_literal(&Value::Decimal(12.5)), "12.5");
        assert_eq!(sql_literal(&Value::from("O'Brien")), "'O''Brien'");
        assert_eq!(sql_literal(&Value::from("")), "''");
        assert_eq!(sql_literal(&Value::Timestamp(ts)), "'2024-02-29 08:05:03.007'");
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(quote_identifier("event_log"), "event_log");
        assert_eq!(quote_identifier("Case ID"), "\"Case ID\"");
        assert_eq!(quote_identifier("1st"), "\"1st\"");
    }

    #[test]
    fn test_empty_input_rejected() {
        let empty: Vec<Record> = Vec::new();
        let err = SqlInsertWriter::new().generate("events", &empty).unwrap_err();
        assert!(matches!(err, OutputError::EmptyInput(_)));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let err = SqlInsertWriter::new()
            .with_batch_size(0)
            .generate("cases", &rows(1))
            .unwrap_err();
        assert!(matches!(err, OutputError::InvalidConfig(_)));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sql").join("cases.sql");

        SqlInsertWriter::new().write_to_file("cases", &rows(3), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("INSERT INTO cases (id, name)"));
    }

    #[test]
    fn test_failed_render_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.sql");
        let empty: Vec<Record> = Vec::new();

        assert!(SqlInsertWriter::new().write_to_file("events", &empty, &path).is_err());
        assert!(!path.exists());
    }
}
