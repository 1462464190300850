//! Built-in vocabulary backed by a JSON document.
//!
//! The document lists both table schemas, a value source per sampling key and
//! a weighted successor list per state label:
//!
//! ```json
//! {
//!   "initial_event": "START",
//!   "final_event": "END",
//!   "schema": {
//!     "cases":  { "columns": [{ "name": "case_id", "display_name": "Case ID", "primary_key": true }] },
//!     "events": { "columns": [ ... ] }
//!   },
//!   "values": {
//!     "resource": { "choice": { "values": ["alice", "bob"], "weights": [3, 1] } },
//!     "amount":   { "integer": { "min": 10, "max": 500 } }
//!   },
//!   "transitions": {
//!     "START": [{ "to": "Register", "weight": 1.0 }]
//!   }
//! }
//! ```
//!
//! Labels without successors transition to the final event.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use tracegen_core::{FieldRole, FieldSpec, SchemaError, TableKind, TableSchema, Value};

use crate::vocabulary::Vocabulary;

/// How values for one sampling key are produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Pick one of `values`, optionally weighted.
    Choice {
        values: Vec<String>,
        #[serde(default)]
        weights: Vec<f64>,
    },
    /// Uniform integer in `[min, max]`.
    Integer { min: i64, max: i64 },
    /// Uniform decimal in `[min, max)`, rounded to `precision` places.
    Decimal {
        min: f64,
        max: f64,
        #[serde(default = "default_precision")]
        precision: u32,
    },
    /// Always the same value.
    Constant { value: Value },
}

fn default_precision() -> u32 {
    2
}

impl ValueSource {
    /// Unweighted choice between `values`.
    pub fn choice<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueSource::Choice {
            values: values.into_iter().map(Into::into).collect(),
            weights: Vec::new(),
        }
    }

    /// Sample a value.
    pub fn sample(&self, rng: &mut impl Rng) -> Value {
        match self {
            ValueSource::Choice { values, weights } => {
                if values.is_empty() {
                    return Value::Null;
                }
                let idx = if weights.is_empty() {
                    rng.gen_range(0..values.len())
                } else {
                    weighted_index(rng, weights).min(values.len() - 1)
                };
                Value::Text(values[idx].clone())
            }
            ValueSource::Integer { min, max } => Value::Integer(rng.gen_range(*min..=*max)),
            ValueSource::Decimal { min, max, precision } => {
                let raw = if min < max { rng.gen_range(*min..*max) } else { *min };
                let scale = 10f64.powi(*precision as i32);
                Value::Decimal((raw * scale).round() / scale)
            }
            ValueSource::Constant { value } => value.clone(),
        }
    }

    fn check(&self, key: &str) -> Result<(), SchemaError> {
        match self {
            ValueSource::Choice { values, weights } => {
                if values.is_empty() {
                    return Err(SchemaError::malformed(format!("value source '{}' has no values", key)));
                }
                if !weights.is_empty() && weights.len() != values.len() {
                    return Err(SchemaError::malformed(format!(
                        "value source '{}' has {} values but {} weights",
                        key,
                        values.len(),
                        weights.len()
                    )));
                }
                check_weights(key, weights.iter().copied())
            }
            ValueSource::Integer { min, max } if min > max => Err(SchemaError::malformed(format!(
                "value source '{}' has inverted range {}..={}",
                key, min, max
            ))),
            ValueSource::Decimal { min, max, .. } if min > max => Err(SchemaError::malformed(format!(
                "value source '{}' has inverted range {}..{}",
                key, min, max
            ))),
            _ => Ok(()),
        }
    }
}

/// One weighted successor of a state label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTransition {
    /// Successor label.
    pub to: String,
    /// Selection weight.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// Both table schemas of a vocabulary document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSet {
    pub cases: TableSchema,
    pub events: TableSchema,
}

/// Serialized form of a [`StaticVocabulary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyDocument {
    pub initial_event: String,
    pub final_event: String,
    pub schema: SchemaSet,
    /// Value sources by sampling key, kept sorted so validation reports
    /// problems in a stable order.
    #[serde(default)]
    pub values: BTreeMap<String, ValueSource>,
    #[serde(default)]
    pub transitions: BTreeMap<String, Vec<WeightedTransition>>,
}

impl VocabularyDocument {
    /// Create a document with no value sources and no transitions.
    pub fn new(
        initial_event: impl Into<String>,
        final_event: impl Into<String>,
        cases: TableSchema,
        events: TableSchema,
    ) -> Self {
        Self {
            initial_event: initial_event.into(),
            final_event: final_event.into(),
            schema: SchemaSet { cases, events },
            values: BTreeMap::new(),
            transitions: BTreeMap::new(),
        }
    }

    /// Register the value source for a sampling key.
    pub fn with_values(mut self, key: impl Into<String>, source: ValueSource) -> Self {
        self.values.insert(key.into(), source);
        self
    }

    /// Add a weighted successor.
    pub fn with_transition(mut self, from: impl Into<String>, to: impl Into<String>, weight: f64) -> Self {
        self.transitions
            .entry(from.into())
            .or_default()
            .push(WeightedTransition { to: to.into(), weight });
        self
    }

    /// Parse a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(|e| SchemaError::malformed(e.to_string()))
    }

    /// Check that the document can drive a generation run.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.initial_event.is_empty() || self.final_event.is_empty() {
            return Err(SchemaError::InvalidMarker("markers must not be empty".into()));
        }
        if self.initial_event == self.final_event {
            return Err(SchemaError::InvalidMarker(format!(
                "start and end marker are both '{}'",
                self.initial_event
            )));
        }

        for (table, schema) in [
            (TableKind::Cases, &self.schema.cases),
            (TableKind::Events, &self.schema.events),
        ] {
            schema.validate(table)?;
            // Every non-key case field and every sampled event field is drawn by name.
            let sampled: Vec<&FieldSpec> = match table {
                TableKind::Cases => schema
                    .columns
                    .iter()
                    .filter(|f| f.role() != FieldRole::PrimaryKey)
                    .collect(),
                TableKind::Events => schema.sampled_fields().collect(),
            };
            for field in sampled {
                if !self.values.contains_key(&field.name) {
                    return Err(SchemaError::unknown_key(table, &field.display_name, &field.name));
                }
            }
        }

        for (key, source) in &self.values {
            source.check(key)?;
        }
        for (from, successors) in &self.transitions {
            check_weights(from, successors.iter().map(|t| t.weight))?;
        }

        Ok(())
    }
}

fn check_weights(key: &str, weights: impl Iterator<Item = f64>) -> Result<(), SchemaError> {
    for weight in weights {
        if !weight.is_finite() || weight < 0.0 {
            return Err(SchemaError::malformed(format!(
                "'{}' has invalid weight {}",
                key, weight
            )));
        }
    }
    Ok(())
}

/// Weighted selection over `weights`.
///
/// Non-positive totals fall back to a uniform pick.
fn weighted_index(rng: &mut impl Rng, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return rng.gen_range(0..weights.len());
    }

    let mut roll = rng.gen::<f64>() * total;
    for (i, w) in weights.iter().enumerate() {
        roll -= w;
        if roll <= 0.0 {
            return i;
        }
    }
    weights.len() - 1
}

/// Vocabulary backed by an immutable [`VocabularyDocument`].
///
/// The document is shared between forks; each fork owns its random state.
#[derive(Clone)]
pub struct StaticVocabulary {
    document: Arc<VocabularyDocument>,
    rng: ChaCha8Rng,
    seed: u64,
}

impl StaticVocabulary {
    /// Validate `document` and seed the sampler.
    pub fn new(document: VocabularyDocument, seed: u64) -> Result<Self, SchemaError> {
        document.validate()?;
        Ok(Self {
            document: Arc::new(document),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        })
    }

    /// Parse, validate and seed.
    pub fn from_json(json: &str, seed: u64) -> Result<Self, SchemaError> {
        Self::new(VocabularyDocument::from_json(json)?, seed)
    }

    /// The underlying document.
    pub fn document(&self) -> &VocabularyDocument {
        &self.document
    }

    /// The seed this vocabulary was created or last reseeded with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Vocabulary for StaticVocabulary {
    fn schema(&self, table: TableKind) -> &TableSchema {
        match table {
            TableKind::Cases => &self.document.schema.cases,
            TableKind::Events => &self.document.schema.events,
        }
    }

    fn start_marker(&self) -> &str {
        &self.document.initial_event
    }

    fn end_marker(&self) -> &str {
        &self.document.final_event
    }

    fn sample(&mut self, key: &str) -> Value {
        match self.document.values.get(key) {
            Some(source) => source.sample(&mut self.rng),
            None => Value::Null,
        }
    }

    fn next_state(&mut self, previous: &str) -> String {
        match self.document.transitions.get(previous) {
            Some(successors) if !successors.is_empty() => {
                let weights: Vec<f64> = successors.iter().map(|t| t.weight).collect();
                let idx = weighted_index(&mut self.rng, &weights);
                successors[idx].to.clone()
            }
            _ => self.document.final_event.clone(),
        }
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.seed = seed;
    }

    fn fork(&self, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(stream);
        Self {
            document: Arc::clone(&self.document),
            rng,
            seed: self.seed,
        }
    }

    fn name(&self) -> &str {
        "static"
    }
}

impl std::fmt::Debug for StaticVocabulary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticVocabulary")
            .field("seed", &self.seed)
            .field("values", &self.document.values.len())
            .field("states", &self.document.transitions.len())
            .finish()
    }
}
