//! Trace generation: one bounded random walk per case.
//!
//! Each walk draws a length `L` from the configured bounds and a start time
//! inside the configured timeframe, then emits up to `L` events. The first
//! label is the start marker, the `L`-th is forced to the end marker, and the
//! labels between are asked of [`Vocabulary::next_state`]. A walk stops as
//! soon as it emits the end marker, so `L` is an upper bound.
//!
//! After every event that does not end the walk, the simulated clock moves
//! forward by independently drawn days, hours and minutes.

use chrono::{Duration, NaiveDateTime, Utc};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use tracegen_core::{
    CaseId, CaseRecord, EventId, EventRecord, FieldRole, FieldSpec, GenerationConfig, Record,
    TableKind, Value,
};

use crate::error::Result;
use crate::progress::{ProgressSink, Stage};
use crate::vocabulary::Vocabulary;

/// The outcome of one case's walk.
#[derive(Debug, Clone, PartialEq)]
pub struct Walk {
    /// The drawn upper bound `L`.
    pub drawn_length: u32,
    /// Whether the end marker was reached before step `L`.
    pub early_terminated: bool,
    /// Events in walk order.
    pub events: Vec<EventRecord>,
}

/// Generates event sequences for cases.
///
/// A generator owns its vocabulary, its random state and its event-id
/// counter, so independent generators never share mutable state.
pub struct TraceGenerator<V> {
    vocabulary: V,
    config: GenerationConfig,
    columns: Vec<FieldSpec>,
    start_marker: String,
    end_marker: String,
    rng: ChaCha8Rng,
    next_id: EventId,
    now: NaiveDateTime,
}

impl<V: Vocabulary> TraceGenerator<V> {
    /// Create a generator.
    ///
    /// The random state is seeded from `config.seed` when present.
    ///
    /// # Errors
    ///
    /// Fails before producing anything when the configuration is invalid or
    /// the events schema lacks a primary key, foreign key, action or date
    /// field.
    pub fn new(vocabulary: V, config: GenerationConfig) -> Result<Self> {
        config.validate()?;
        let schema = vocabulary.schema(TableKind::Events);
        schema.validate(TableKind::Events)?;

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            columns: schema.columns.clone(),
            start_marker: vocabulary.start_marker().to_string(),
            end_marker: vocabulary.end_marker().to_string(),
            vocabulary,
            config,
            rng,
            next_id: EventId::FIRST,
            now: Utc::now().naive_utc(),
        })
    }

    /// Select an independent random stream of the same seed.
    pub fn with_stream(mut self, stream: u64) -> Self {
        self.rng.set_stream(stream);
        self
    }

    /// Start numbering events at `first`.
    pub fn with_first_id(mut self, first: EventId) -> Self {
        self.next_id = first;
        self
    }

    /// Fix the reference time start timestamps are drawn against.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    /// The id the next event will receive.
    pub fn next_id(&self) -> EventId {
        self.next_id
    }

    /// Run one walk for `case_id`.
    pub fn walk(&mut self, case_id: CaseId) -> Walk {
        let drawn_length = self.rng.gen_range(self.config.events_range());
        let mut timestamp = self.draw_start();
        let mut events = Vec::with_capacity(drawn_length as usize);
        let mut early_terminated = false;
        let mut previous = self.start_marker.clone();

        for step in 0..drawn_length {
            let label = if step == 0 {
                self.start_marker.clone()
            } else if step == drawn_length - 1 {
                self.end_marker.clone()
            } else {
                self.vocabulary.next_state(&previous)
            };

            events.push(self.build_event(case_id, &label, timestamp));

            if label == self.end_marker {
                early_terminated = step + 1 < drawn_length;
                break;
            }

            timestamp += self.draw_delta();
            previous = label;
        }

        Walk {
            drawn_length,
            early_terminated,
            events,
        }
    }

    /// Events of one case in walk order.
    pub fn generate_case(&mut self, case_id: CaseId) -> Vec<EventRecord> {
        self.walk(case_id).events
    }

    /// Events of every case in `cases`, concatenated in case order.
    pub fn generate(&mut self, cases: &[CaseRecord], progress: &mut dyn ProgressSink) -> Vec<EventRecord> {
        let total = cases.len() as u64;
        let mut events = Vec::with_capacity(cases.len() * self.config.max_events_per_case as usize);

        for (done, case) in cases.iter().enumerate() {
            events.extend(self.generate_case(case.id));
            progress.update(Stage::Events, done as u64 + 1, total);
        }
        progress.finish(Stage::Events, total);

        debug!(
            cases = total,
            events = events.len(),
            vocabulary = self.vocabulary.name(),
            "Generated traces"
        );
        events
    }

    fn draw_start(&mut self) -> NaiveDateTime {
        let window = self.config.timeframe().num_milliseconds();
        let offset = self.rng.gen_range(0..=window);
        self.now - Duration::milliseconds(offset)
    }

    fn draw_delta(&mut self) -> Duration {
        let days = self.rng.gen_range(self.config.days_range());
        let hours = self.rng.gen_range(self.config.hours_range());
        let minutes = self.rng.gen_range(self.config.minutes_range());
        Duration::days(days as i64) + Duration::hours(hours as i64) + Duration::minutes(minutes as i64)
    }

    fn build_event(&mut self, case_id: CaseId, label: &str, timestamp: NaiveDateTime) -> EventRecord {
        let id = self.next_id;
        self.next_id = id.next();

        let mut record = Record::with_capacity(self.columns.len());
        for field in &self.columns {
            let value = match field.role() {
                FieldRole::PrimaryKey => Value::from(id.inner()),
                FieldRole::ForeignKey => Value::from(case_id.inner()),
                FieldRole::EventAction => Value::from(label),
                FieldRole::EventDate => Value::Timestamp(timestamp),
                FieldRole::Sampled => self.vocabulary.sample(&field.name),
            };
            record.push(field.display_name.clone(), value);
        }

        EventRecord {
            id,
            case_id,
            action: label.to_string(),
            timestamp,
            record,
        }
    }
}

impl<V> std::fmt::Debug for TraceGenerator<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceGenerator")
            .field("start_marker", &self.start_marker)
            .field("end_marker", &self.end_marker)
            .field("next_id", &self.next_id)
            .field("now", &self.now)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::fixtures::order_vocabulary;
    use crate::progress::NoProgress;
    use crate::static_vocab::{StaticVocabulary, ValueSource, VocabularyDocument};
    use chrono::NaiveDate;
    use tracegen_core::{ConfigError, SchemaError, TableSchema};

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn generator(config: GenerationConfig, seed: u64) -> TraceGenerator<StaticVocabulary> {
        TraceGenerator::new(order_vocabulary(seed), config.with_seed(seed))
            .unwrap()
            .with_now(fixed_now())
    }

    #[test]
    fn test_two_step_walks() {
        let config = GenerationConfig::default()
            .with_num_cases(3)
            .with_events_per_case(2, 2);
        let mut gen = generator(config, 1);

        let mut all = Vec::new();
        for case in 1..=3 {
            let events = gen.generate_case(CaseId(case));
            let labels: Vec<&str> = events.iter().map(|e| e.action.as_str()).collect();
            assert_eq!(labels, vec!["START", "END"]);
            assert!(events.iter().all(|e| e.case_id == CaseId(case)));
            all.extend(events);
        }

        let ids: Vec<u64> = all.iter().map(|e| e.id.inner()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_walks_start_and_end_with_markers() {
        let config = GenerationConfig::default().with_events_per_case(2, 9);
        let mut gen = generator(config, 17);

        for case in 1..=200 {
            let walk = gen.walk(CaseId(case));
            let first = walk.events.first().unwrap();
            let last = walk.events.last().unwrap();
            assert_eq!(first.action, "START");
            assert_eq!(last.action, "END");

            let len = walk.events.len() as u32;
            assert!(len >= 1 && len <= 9);
            if walk.early_terminated {
                assert!(len < walk.drawn_length);
            } else {
                assert_eq!(len, walk.drawn_length);
            }
        }
    }

    #[test]
    fn test_early_termination_happens() {
        // Register -> END is reachable before the forced final step.
        let config = GenerationConfig::default().with_events_per_case(8, 8);
        let mut gen = generator(config, 23);

        let early = (1..=200)
            .map(|case| gen.walk(CaseId(case)))
            .filter(|walk| walk.early_terminated)
            .count();
        assert!(early > 0);
    }

    #[test]
    fn test_timestamps_within_delta_bounds() {
        let config = GenerationConfig::default()
            .with_events_per_case(2, 10)
            .with_deltas((1, 2), (0, 5), (10, 30));
        let min = config.min_delta();
        let max = config.max_delta();
        let mut gen = generator(config, 5);

        for case in 1..=100 {
            let events = gen.generate_case(CaseId(case));
            for pair in events.windows(2) {
                let delta = pair[1].timestamp - pair[0].timestamp;
                assert!(delta >= min && delta <= max, "delta {} out of bounds", delta);
            }
        }
    }

    #[test]
    fn test_start_within_timeframe() {
        let config = GenerationConfig::default().with_timeframe_years(1);
        let mut gen = generator(config, 9);

        for case in 1..=100 {
            let first = gen.generate_case(CaseId(case)).remove(0);
            assert!(first.timestamp <= fixed_now());
            assert!(first.timestamp >= fixed_now() - Duration::days(365));
        }
    }

    #[test]
    fn test_record_columns() {
        let config = GenerationConfig::default().with_events_per_case(3, 3);
        let mut gen = generator(config, 2);

        let events = gen.generate_case(CaseId(4));
        for event in &events {
            assert_eq!(event.record.get("Event ID"), Some(&Value::Integer(event.id.inner() as i64)));
            assert_eq!(event.record.get("Case ID"), Some(&Value::Integer(4)));
            assert_eq!(event.record.get("Activity"), Some(&Value::Text(event.action.clone())));
            assert_eq!(event.record.get("Timestamp"), Some(&Value::Timestamp(event.timestamp)));
            assert!(event.record.get("Resource").and_then(Value::as_text).is_some());
        }
    }

    #[test]
    fn test_first_id_offset() {
        let config = GenerationConfig::default().with_events_per_case(2, 2);
        let mut gen = generator(config, 2).with_first_id(EventId(101));

        let events = gen.generate_case(CaseId(1));
        assert_eq!(events[0].id, EventId(101));
        assert_eq!(events[1].id, EventId(102));
        assert_eq!(gen.next_id(), EventId(103));
    }

    #[test]
    fn test_same_seed_same_output() {
        let config = GenerationConfig::default();
        let mut a = generator(config.clone(), 77);
        let mut b = generator(config, 77);

        let cases: Vec<CaseRecord> = (1..=20)
            .map(|i| CaseRecord::new(CaseId(i), Record::new()))
            .collect();
        assert_eq!(a.generate(&cases, &mut NoProgress), b.generate(&cases, &mut NoProgress));
    }

    #[test]
    fn test_ids_strictly_increasing() {
        let mut gen = generator(GenerationConfig::default(), 31);
        let cases: Vec<CaseRecord> = (1..=50)
            .map(|i| CaseRecord::new(CaseId(i), Record::new()))
            .collect();

        let events = gen.generate(&cases, &mut NoProgress);
        assert!(events.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn test_walk_beyond_calendar_rejected_at_construction() {
        let config = GenerationConfig::default()
            .with_events_per_case(12, 12)
            .with_deltas((100_000_000, 100_000_000), (0, 0), (0, 0));
        let err = TraceGenerator::new(order_vocabulary(0), config).unwrap_err();
        assert!(matches!(err, GenerationError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_longest_allowed_walk_stays_in_range() {
        let years = tracegen_core::config::MAX_TIMEFRAME_YEARS;
        let days = (tracegen_core::config::MAX_WALK_SPAN_DAYS / 7) as u32;
        let config = GenerationConfig::default()
            .with_timeframe_years(years)
            .with_events_per_case(8, 8)
            .with_deltas((days, days), (0, 0), (0, 0));
        let mut gen = generator(config, 3);

        for case in 1..=20 {
            let events = gen.generate_case(CaseId(case));
            assert!(events.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        }
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = GenerationConfig::default().with_events_per_case(4, 2);
        let err = TraceGenerator::new(order_vocabulary(0), config).unwrap_err();
        assert!(matches!(err, GenerationError::Config(ConfigError::InvertedRange { .. })));
    }

    /// Vocabulary that skips document validation, to exercise the
    /// generator's own schema check.
    struct BareVocabulary {
        cases: TableSchema,
        events: TableSchema,
    }

    impl Vocabulary for BareVocabulary {
        fn schema(&self, table: TableKind) -> &TableSchema {
            match table {
                TableKind::Cases => &self.cases,
                TableKind::Events => &self.events,
            }
        }

        fn start_marker(&self) -> &str {
            "START"
        }

        fn end_marker(&self) -> &str {
            "END"
        }

        fn sample(&mut self, _key: &str) -> Value {
            Value::Null
        }

        fn next_state(&mut self, _previous: &str) -> String {
            "END".to_string()
        }

        fn reseed(&mut self, _seed: u64) {}

        fn fork(&self, _stream: u64) -> Self {
            Self {
                cases: self.cases.clone(),
                events: self.events.clone(),
            }
        }
    }

    #[test]
    fn test_schema_without_action_fails_fast() {
        let vocab = BareVocabulary {
            cases: TableSchema::new([FieldSpec::new("id", "id").primary_key()]),
            events: TableSchema::new([
                FieldSpec::new("id", "id").primary_key(),
                FieldSpec::new("case", "case").foreign_key(),
                FieldSpec::new("ts", "ts").event_date(),
            ]),
        };

        let err = TraceGenerator::new(vocab, GenerationConfig::default()).unwrap_err();
        assert_eq!(
            err,
            GenerationError::Schema(SchemaError::missing(TableKind::Events, "event_action"))
        );
    }

    #[test]
    fn test_state_without_successors_ends_walk() {
        let cases = TableSchema::new([FieldSpec::new("id", "id").primary_key()]);
        let events = TableSchema::new([
            FieldSpec::new("id", "id").primary_key(),
            FieldSpec::new("case", "case").foreign_key(),
            FieldSpec::new("act", "act").event_action(),
            FieldSpec::new("ts", "ts").event_date(),
            FieldSpec::new("note", "note"),
        ]);
        let document = VocabularyDocument::new("open", "closed", cases, events)
            .with_values("note", ValueSource::choice(["n/a"]))
            .with_transition("open", "pending", 1.0);
        let vocab = StaticVocabulary::new(document, 0).unwrap();

        let config = GenerationConfig::default().with_events_per_case(10, 10).with_seed(0);
        let mut gen = TraceGenerator::new(vocab, config).unwrap();
        let walk = gen.walk(CaseId(1));

        let labels: Vec<&str> = walk.events.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(labels, vec!["open", "pending", "closed"]);
        assert!(walk.early_terminated);
    }
}
