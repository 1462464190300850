//! Case and event records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::ids::{CaseId, EventId};
use crate::value::{Record, Value};

/// One simulated process instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// 1-based ordinal, also written to the primary-key column.
    pub id: CaseId,
    /// Output row in schema order.
    pub record: Record,
}

impl CaseRecord {
    /// Create a case record.
    pub fn new(id: CaseId, record: Record) -> Self {
        Self { id, record }
    }
}

/// One step of a case's walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    /// Owning case.
    pub case_id: CaseId,
    /// State label.
    pub action: String,
    /// Simulated time of the step.
    pub timestamp: NaiveDateTime,
    /// Output row in schema order.
    pub record: Record,
}

impl EventRecord {
    /// Assign a new id, rewriting the primary-key column as well.
    pub fn renumber(&mut self, id: EventId, key_column: &str) {
        self.id = id;
        self.record.set(key_column, Value::from(id.inner()));
    }
}
