//! Table schemas and field roles.
//!
//! A schema is an ordered list of [`FieldSpec`]s. Each field carries a
//! semantic `name` used as the sampling key and a `display_name` used as
//! the output column. Role flags are not mutually exclusive; when a field
//! carries several, [`FieldSpec::role`] resolves them with a fixed
//! precedence: primary key, foreign key, event action, event date.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SchemaError;

/// Columns whose display name starts with this marker are internal and
/// omitted from delimited output headers.
pub const INTERNAL_FIELD_MARKER: char = '_';

/// Whether the output column `display_name` is internal.
pub fn is_internal_column(display_name: &str) -> bool {
    display_name.starts_with(INTERNAL_FIELD_MARKER)
}

/// The two tables a vocabulary describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// One row per process instance.
    Cases,
    /// One row per walk step.
    Events,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Cases => write!(f, "cases"),
            TableKind::Events => write!(f, "events"),
        }
    }
}

/// The structural role a field plays when a record is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    PrimaryKey,
    ForeignKey,
    EventAction,
    EventDate,
    /// Filled from the vocabulary by the field's semantic name.
    Sampled,
}

/// Schema entry for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Semantic key used for value sampling.
    pub name: String,
    /// Output column name.
    pub display_name: String,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub foreign_key: bool,
    #[serde(default)]
    pub event_action: bool,
    #[serde(default)]
    pub event_date: bool,
}

impl FieldSpec {
    /// Create a sampled field with no role flags.
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            primary_key: false,
            foreign_key: false,
            event_action: false,
            event_date: false,
        }
    }

    /// Mark as primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark as foreign key into the cases table.
    pub fn foreign_key(mut self) -> Self {
        self.foreign_key = true;
        self
    }

    /// Mark as the state label column.
    pub fn event_action(mut self) -> Self {
        self.event_action = true;
        self
    }

    /// Mark as the timestamp column.
    pub fn event_date(mut self) -> Self {
        self.event_date = true;
        self
    }

    /// Resolve the effective role.
    pub fn role(&self) -> FieldRole {
        if self.primary_key {
            FieldRole::PrimaryKey
        } else if self.foreign_key {
            FieldRole::ForeignKey
        } else if self.event_action {
            FieldRole::EventAction
        } else if self.event_date {
            FieldRole::EventDate
        } else {
            FieldRole::Sampled
        }
    }
}

/// Ordered column list of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<FieldSpec>,
}

impl TableSchema {
    /// Create a schema from its columns.
    pub fn new(columns: impl IntoIterator<Item = FieldSpec>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }

    /// The first field resolving to `role`.
    pub fn field_with_role(&self, role: FieldRole) -> Option<&FieldSpec> {
        self.columns.iter().find(|f| f.role() == role)
    }

    /// Fields filled by vocabulary sampling.
    pub fn sampled_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.columns.iter().filter(|f| f.role() == FieldRole::Sampled)
    }

    /// The primary-key field.
    pub fn primary_key(&self) -> Option<&FieldSpec> {
        self.field_with_role(FieldRole::PrimaryKey)
    }

    /// Check the roles `table` requires.
    ///
    /// Both tables need exactly one primary key. The events table also needs
    /// exactly one foreign key and at least one action and one date field.
    pub fn validate(&self, table: TableKind) -> Result<(), SchemaError> {
        self.require_unique(table, FieldRole::PrimaryKey, "primary_key")?;
        if table == TableKind::Events {
            self.require_unique(table, FieldRole::ForeignKey, "foreign_key")?;
            if self.field_with_role(FieldRole::EventAction).is_none() {
                return Err(SchemaError::missing(table, "event_action"));
            }
            if self.field_with_role(FieldRole::EventDate).is_none() {
                return Err(SchemaError::missing(table, "event_date"));
            }
        }
        Ok(())
    }

    fn require_unique(
        &self,
        table: TableKind,
        role: FieldRole,
        label: &'static str,
    ) -> Result<(), SchemaError> {
        match self.columns.iter().filter(|f| f.role() == role).count() {
            0 => Err(SchemaError::missing(table, label)),
            1 => Ok(()),
            _ => Err(SchemaError::duplicate(table, label)),
        }
    }
}
