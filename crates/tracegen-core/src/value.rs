//! Scalar values and ordered records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed textual timestamp format, millisecond precision, zero-padded.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// A scalar cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value.
    Null,
    /// Whole number.
    Integer(i64),
    /// Floating point number.
    Decimal(f64),
    /// Free text.
    Text(String),
    /// Point in time, rendered with [`TIMESTAMP_FORMAT`].
    #[serde(skip_deserializing)]
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Whether writers should quote this value in SQL output.
    pub fn is_textual(&self) -> bool {
        matches!(self, Value::Text(_) | Value::Timestamp(_))
    }

    /// Returns the integer payload, if any.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

/// An ordered mapping from column display name to value.
///
/// Column order is insertion order, which is the schema order for every
/// record the generators produce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record with room for `capacity` columns.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Append a column.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((column.into(), value.into()));
    }

    /// Replace the value of an existing column, returning the previous one.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Option<Value> {
        self.fields
            .iter_mut()
            .find(|(name, _)| name == column)
            .map(|(_, slot)| std::mem::replace(slot, value.into()))
    }

    /// Look up a column by display name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Values in column order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    /// Iterate over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether two records have the same columns in the same order.
    pub fn same_shape(&self, other: &Record) -> bool {
        self.len() == other.len() && self.columns().eq(other.columns())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_timestamp_rendering() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_milli_opt(7, 8, 9, 45)
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2024-03-05 07:08:09.045");
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Integer(-3).to_string(), "-3");
        assert_eq!(Value::Text("Approve".into()).to_string(), "Approve");
        assert_eq!(Value::Null.to_string(), "");
        assert!(Value::Text("x".into()).is_textual());
        assert!(!Value::Decimal(1.5).is_textual());
    }

    #[test]
    fn test_record_order_and_lookup() {
        let mut record = Record::new();
        record.push("id", 1i64);
        record.push("name", "alpha");
        record.push("_internal", Value::Null);

        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["id", "name", "_internal"]);
        assert_eq!(record.get("name"), Some(&Value::Text("alpha".into())));
        assert_eq!(record.get("missing"), None);

        let previous = record.set("id", 9i64);
        assert_eq!(previous, Some(Value::Integer(1)));
        assert_eq!(record.get("id"), Some(&Value::Integer(9)));
        assert_eq!(record.set("missing", 1i64), None);
    }

    #[test]
    fn test_record_shape() {
        let mut a = Record::new();
        a.push("x", 1i64);
        a.push("y", 2i64);
        let mut b = Record::new();
        b.push("x", 5i64);
        b.push("y", "text");
        let mut c = Record::new();
        c.push("y", 1i64);
        c.push("x", 2i64);

        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
    }

    #[test]
    fn test_untagged_deserialization() {
        let values: Vec<Value> = serde_json::from_str(r#"[null, 3, 2.5, "text"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Integer(3),
                Value::Decimal(2.5),
                Value::Text("text".into())
            ]
        );
    }
}
