//! Delimited text output.
//!
//! The header row lists every column except internal ones (display name
//! starting with [`INTERNAL_FIELD_MARKER`]). Fields containing the
//! delimiter, a double quote or a line break are quoted with `"` and inner
//! quotes doubled; everything else is written as rendered by
//! [`Value`]'s `Display`. Empty text is written as `""` so it stays distinct
//! from a null, which is written as nothing. Every record, the header
//! included, ends with a newline.
//!
//! [`INTERNAL_FIELD_MARKER`]: tracegen_core::INTERNAL_FIELD_MARKER

use std::path::Path;

use tracegen_core::{is_internal_column, Record, Value};
use tracing::instrument;

use crate::error::{OutputError, Result};
use crate::file::write_atomic;
use crate::table::{header, Row};

#[derive(Debug, Clone)]
struct DelimitedConfig {
    /// Field separator (default: `,`).
    delimiter: char,
}

impl Default for DelimitedConfig {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

impl DelimitedConfig {
    fn validate(&self) -> Result<()> {
        if self.delimiter == '"' || self.delimiter == '\n' || self.delimiter == '\r' {
            return Err(OutputError::InvalidConfig(format!(
                "{:?} cannot be used as a delimiter",
                self.delimiter
            )));
        }
        Ok(())
    }
}

/// Renders a table as delimited text.
#[derive(Debug, Clone, Default)]
pub struct DelimitedWriter {
    config: DelimitedConfig,
}

impl DelimitedWriter {
    /// Create a comma-separated writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field separator.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// Render `rows`. `table` is only used in error messages.
    #[instrument(skip(self, rows), fields(table = %table, rows = rows.len()))]
    pub fn generate<R: Row>(&self, table: &str, rows: &[R]) -> Result<String> {
        self.config.validate()?;
        let columns: Vec<&str> = header(table, rows)?
            .into_iter()
            .filter(|c| !is_internal_column(c))
            .collect();

        let separator = self.config.delimiter.to_string();
        let mut text = columns
            .iter()
            .map(|c| self.escape(c))
            .collect::<Vec<_>>()
            .join(&separator);
        text.push('\n');

        for row in rows {
            let record = row.record();
            let line = columns
                .iter()
                .map(|c| match record.get(c) {
                    Some(Value::Text(s)) if s.is_empty() => "\"\"".to_string(),
                    Some(value) => self.escape(&value.to_string()),
                    None => String::new(),
                })
                .collect::<Vec<_>>()
                .join(&separator);
            text.push_str(&line);
            text.push('\n');
        }

        Ok(text)
    }

    /// Render `rows` and write them atomically to `path`.
    pub fn write_to_file<R: Row>(&self, table: &str, rows: &[R], path: impl AsRef<Path>) -> Result<()> {
        let text = self.generate(table, rows)?;
        write_atomic(path, text.as_bytes())
    }

    fn escape(&self, field: &str) -> String {
        let needs_quotes = field.contains(self.config.delimiter)
            || field.contains('"')
            || field.contains('\n')
            || field.contains('\r');
        if needs_quotes {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }
}

/// Parses delimited text back into records keyed by header.
///
/// Every value comes back as [`Value::Text`]. An unquoted empty field is
/// [`Value::Null`]; a quoted empty field is empty text. Rows with a
/// different field count than the header are rejected.
#[derive(Debug, Clone, Default)]
pub struct DelimitedReader {
    config: DelimitedConfig,
}

impl DelimitedReader {
    /// Create a comma-separated reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field separator.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// Parse `text`.
    pub fn parse(&self, text: &str) -> Result<Vec<Record>> {
        self.config.validate()?;
        let mut lines = split_records(text, self.config.delimiter)?.into_iter();

        let Some(header) = lines.next() else {
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        for (index, fields) in lines.enumerate() {
            if fields.len() != header.len() {
                return Err(OutputError::malformed(
                    index + 2,
                    format!("expected {} fields, found {}", header.len(), fields.len()),
                ));
            }
            let mut record = Record::with_capacity(header.len());
            for (column, field) in header.iter().zip(fields) {
                let value = if field.text.is_empty() && !field.quoted {
                    Value::Null
                } else {
                    Value::Text(field.text)
                };
                record.push(column.text.clone(), value);
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Read and parse the file at `path`.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<Vec<Record>> {
        let text = std::fs::read_to_string(path)?;
        self.parse(&text)
    }
}

/// One unescaped field and whether it was quoted.
#[derive(Debug, Default, PartialEq)]
struct RawField {
    text: String,
    quoted: bool,
}

/// Split text into rows of unescaped fields.
///
/// A line break ends a record. Text after the last line break is one more
/// record if it holds anything at all, so input without a trailing newline
/// parses the same as input with one.
fn split_records(text: &str, delimiter: char) -> Result<Vec<Vec<RawField>>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = RawField::default();
    let mut in_quotes = false;
    let mut line_started = false;
    let mut line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.text.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.text.push(c);
                }
                _ => field.text.push(c),
            }
            continue;
        }

        match c {
            '"' if field.text.is_empty() && !field.quoted => {
                in_quotes = true;
                field.quoted = true;
                line_started = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                line_started = false;
                line += 1;
            }
            c if c == delimiter => {
                row.push(std::mem::take(&mut field));
                line_started = true;
            }
            _ => {
                field.text.push(c);
                line_started = true;
            }
        }
    }

    if in_quotes {
        return Err(OutputError::malformed(line, "unterminated quoted field"));
    }
    if line_started {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(id: i64, action: &str) -> Record {
        let ts = NaiveDate::from_ymd_opt(2023, 7, 1)
            .unwrap()
            .and_hms_milli_opt(9, 30, 0, 250)
            .unwrap();
        let mut record = Record::new();
        record.push("Event ID", id);
        record.push("Activity", action);
        record.push("Timestamp", ts);
        record.push("_weight", 0.5);
        record
    }

    #[test]
    fn test_internal_columns_omitted() {
        let text = DelimitedWriter::new()
            .generate("events", &[event(1, "START"), event(2, "END")])
            .unwrap();

        assert_eq!(
            text,
            "Event ID,Activity,Timestamp\n\
             1,START,2023-07-01 09:30:00.250\n\
             2,END,2023-07-01 09:30:00.250\n"
        );
    }

    #[test]
    fn test_custom_delimiter() {
        let text = DelimitedWriter::new()
            .with_delimiter(';')
            .generate("events", &[event(1, "a;b")])
            .unwrap();

        assert_eq!(text.lines().next(), Some("Event ID;Activity;Timestamp"));
        assert!(text.contains("1;\"a;b\";"));
    }

    #[test]
    fn test_quoting() {
        let writer = DelimitedWriter::new();
        assert_eq!(writer.escape("plain"), "plain");
        assert_eq!(writer.escape("a,b"), "\"a,b\"");
        assert_eq!(writer.escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(writer.escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_round_trip_by_header() {
        let mut tricky = event(3, "Review, then \"approve\"");
        tricky.set("Timestamp", Value::Null);
        let rows = vec![event(1, "START"), tricky, event(2, "END")];

        let text = DelimitedWriter::new().generate("events", &rows).unwrap();
        let parsed = DelimitedReader::new().parse(&text).unwrap();

        assert_eq!(parsed.len(), rows.len());
        for (original, parsed) in rows.iter().zip(&parsed) {
            assert_eq!(parsed.get("_weight"), None);
            for column in ["Event ID", "Activity", "Timestamp"] {
                let expected = match original.get(column).unwrap() {
                    Value::Null => Value::Null,
                    other => Value::Text(other.to_string()),
                };
                assert_eq!(parsed.get(column), Some(&expected), "column {}", column);
            }
        }
    }

    #[test]
    fn test_single_column_trailing_null_kept() {
        let rows: Vec<Record> = [Value::from("a"), Value::Null]
            .into_iter()
            .map(|value| {
                let mut record = Record::new();
                record.push("note", value);
                record
            })
            .collect();

        let text = DelimitedWriter::new().generate("notes", &rows).unwrap();
        assert_eq!(text, "note\na\n\n");

        let parsed = DelimitedReader::new().parse(&text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].get("note"), Some(&Value::from("a")));
        assert_eq!(parsed[1].get("note"), Some(&Value::Null));
    }

    #[test]
    fn test_empty_text_distinct_from_null() {
        let mut record = Record::new();
        record.push("code", "");
        record.push("comment", Value::Null);
        record.push("owner", "bob");

        let text = DelimitedWriter::new().generate("cases", &[record]).unwrap();
        assert_eq!(text, "code,comment,owner\n\"\",,bob\n");

        let parsed = DelimitedReader::new().parse(&text).unwrap();
        assert_eq!(parsed[0].get("code"), Some(&Value::from("")));
        assert_eq!(parsed[0].get("comment"), Some(&Value::Null));
        assert_eq!(parsed[0].get("owner"), Some(&Value::from("bob")));
    }

    #[test]
    fn test_split_without_trailing_newline() {
        let with = split_records("a,b\n1,\n", ',').unwrap();
        let without = split_records("a,b\n1,", ',').unwrap();
        assert_eq!(with, without);
        assert_eq!(with.len(), 2);

        // A lone empty final field is still a record.
        let rows = split_records("a\n1\n\n", ',').unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], vec![RawField::default()]);
    }

    #[test]
    fn test_reader_rejects_ragged_rows() {
        let err = DelimitedReader::new().parse("a,b\n1,2\n3").unwrap_err();
        assert!(matches!(err, OutputError::Malformed { line: 3, .. }));
    }

    #[test]
    fn test_reader_rejects_unterminated_quote() {
        let err = DelimitedReader::new().parse("a\n\"open").unwrap_err();
        assert!(matches!(err, OutputError::Malformed { .. }));
    }

    #[test]
    fn test_empty_input_rejected() {
        let empty: Vec<Record> = Vec::new();
        assert!(matches!(
            DelimitedWriter::new().generate("cases", &empty),
            Err(OutputError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_quote_delimiter_rejected() {
        let err = DelimitedWriter::new()
            .with_delimiter('"')
            .generate("events", &[event(1, "START")])
            .unwrap_err();
        assert!(matches!(err, OutputError::InvalidConfig(_)));
    }

    #[test]
    fn test_write_and_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("csv").join("events.csv");

        DelimitedWriter::new()
            .write_to_file("events", &[event(1, "START")], &path)
            .unwrap();
        let records = DelimitedReader::new().read_file(&path).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Activity"), Some(&Value::from("START")));
    }
}
