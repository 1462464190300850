//! Row access shared by all writers.

use tracegen_core::{CaseRecord, EventRecord, Record};

use crate::error::{OutputError, Result};

/// Anything that renders as one output row.
pub trait Row {
    fn record(&self) -> &Record;
}

impl Row for Record {
    fn record(&self) -> &Record {
        self
    }
}

impl Row for CaseRecord {
    fn record(&self) -> &Record {
        &self.record
    }
}

impl Row for EventRecord {
    fn record(&self) -> &Record {
        &self.record
    }
}

impl<R: Row + ?Sized> Row for &R {
    fn record(&self) -> &Record {
        (**self).record()
    }
}

/// Header of a non-empty, uniformly shaped table.
pub(crate) fn header<'a, R: Row>(table: &str, rows: &'a [R]) -> Result<Vec<&'a str>> {
    let first = rows.first().ok_or_else(|| OutputError::empty(table))?.record();

    for (index, row) in rows.iter().enumerate().skip(1) {
        if !first.same_shape(row.record()) {
            return Err(OutputError::ShapeMismatch {
                table: table.to_string(),
                row: index,
            });
        }
    }

    Ok(first.columns().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(columns: &[&str]) -> Record {
        let mut record = Record::new();
        for column in columns {
            record.push(*column, 1i64);
        }
        record
    }

    #[test]
    fn test_header_from_first_row() {
        let rows = vec![row(&["a", "b"]), row(&["a", "b"])];
        assert_eq!(header("t", &rows).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_table_rejected() {
        let rows: Vec<Record> = Vec::new();
        assert!(matches!(header("t", &rows), Err(OutputError::EmptyInput(t)) if t == "t"));
    }

    #[test]
    fn test_shape_mismatch_names_row() {
        let rows = vec![row(&["a", "b"]), row(&["a", "b"]), row(&["a"])];
        assert!(matches!(
            header("t", &rows),
            Err(OutputError::ShapeMismatch { row: 2, .. })
        ));
    }
}
