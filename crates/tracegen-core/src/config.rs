//! Generation bounds.
//!
//! A [`GenerationConfig`] is owned by the caller and stays immutable for the
//! duration of a run. [`GenerationConfig::validate`] must pass before any
//! case or event is produced.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::ConfigError;

/// Days per simulated year when computing the start-time window.
pub const DAYS_PER_YEAR: i64 = 365;

/// Upper bound on `timeframe_years`.
pub const MAX_TIMEFRAME_YEARS: u32 = 1_000;

/// Upper bound on how far one walk can advance its clock, in days.
///
/// Together with [`MAX_TIMEFRAME_YEARS`] this keeps every simulated
/// timestamp inside chrono's representable range.
pub const MAX_WALK_SPAN_DAYS: u64 = 10_000 * DAYS_PER_YEAR as u64;

/// Bounds for case and event generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Number of cases to generate.
    pub num_cases: u64,

    /// Lower bound of the drawn walk length.
    pub min_events_per_case: u32,

    /// Upper bound of the drawn walk length.
    pub max_events_per_case: u32,

    /// How far in the past a case may start.
    pub timeframe_years: u32,

    pub min_days: u32,
    pub max_days: u32,
    pub min_hours: u32,
    pub max_hours: u32,
    pub min_minutes: u32,
    pub max_minutes: u32,

    /// Seed for reproducible runs. `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            num_cases: 1_000,
            min_events_per_case: 3,
            max_events_per_case: 12,
            timeframe_years: 2,
            min_days: 0,
            max_days: 3,
            min_hours: 0,
            max_hours: 23,
            min_minutes: 0,
            max_minutes: 59,
            seed: None,
        }
    }
}

impl GenerationConfig {
    /// Set the number of cases.
    pub fn with_num_cases(mut self, num_cases: u64) -> Self {
        self.num_cases = num_cases;
        self
    }

    /// Set the walk length bounds.
    pub fn with_events_per_case(mut self, min: u32, max: u32) -> Self {
        self.min_events_per_case = min;
        self.max_events_per_case = max;
        self
    }

    /// Set all inter-event delta bounds at once.
    pub fn with_deltas(mut self, days: (u32, u32), hours: (u32, u32), minutes: (u32, u32)) -> Self {
        (self.min_days, self.max_days) = days;
        (self.min_hours, self.max_hours) = hours;
        (self.min_minutes, self.max_minutes) = minutes;
        self
    }

    /// Set the start-time window in years.
    pub fn with_timeframe_years(mut self, years: u32) -> Self {
        self.timeframe_years = years;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Walk length bounds as an inclusive range.
    pub fn events_range(&self) -> RangeInclusive<u32> {
        self.min_events_per_case..=self.max_events_per_case
    }

    pub fn days_range(&self) -> RangeInclusive<u32> {
        self.min_days..=self.max_days
    }

    pub fn hours_range(&self) -> RangeInclusive<u32> {
        self.min_hours..=self.max_hours
    }

    pub fn minutes_range(&self) -> RangeInclusive<u32> {
        self.min_minutes..=self.max_minutes
    }

    /// Width of the start-time window.
    pub fn timeframe(&self) -> Duration {
        Duration::days(self.timeframe_years as i64 * DAYS_PER_YEAR)
    }

    /// Smallest possible gap between consecutive events of one case.
    pub fn min_delta(&self) -> Duration {
        Duration::days(self.min_days as i64)
            + Duration::hours(self.min_hours as i64)
            + Duration::minutes(self.min_minutes as i64)
    }

    /// Largest possible gap between consecutive events of one case.
    pub fn max_delta(&self) -> Duration {
        Duration::days(self.max_days as i64)
            + Duration::hours(self.max_hours as i64)
            + Duration::minutes(self.max_minutes as i64)
    }

    /// Upper bound on the number of events `cases` cases can produce.
    pub fn max_events_for(&self, cases: u64) -> u64 {
        cases.saturating_mul(self.max_events_per_case as u64)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_cases == 0 {
            return Err(ConfigError::NotPositive("num_cases"));
        }
        // A walk needs room for both the start and the end marker.
        if self.min_events_per_case < 2 {
            return Err(ConfigError::invalid(format!(
                "min_events_per_case must be at least 2, got {}",
                self.min_events_per_case
            )));
        }

        let ranges = [
            ("events_per_case", self.min_events_per_case, self.max_events_per_case),
            ("days", self.min_days, self.max_days),
            ("hours", self.min_hours, self.max_hours),
            ("minutes", self.min_minutes, self.max_minutes),
        ];
        for (name, min, max) in ranges {
            if min > max {
                return Err(ConfigError::inverted(name, min, max));
            }
        }

        if self.timeframe_years > MAX_TIMEFRAME_YEARS {
            return Err(ConfigError::invalid(format!(
                "timeframe_years must be at most {}, got {}",
                MAX_TIMEFRAME_YEARS, self.timeframe_years
            )));
        }

        // Worst case: every step of the longest walk takes the largest delta.
        let max_delta_minutes = self.max_days as u128 * 24 * 60
            + self.max_hours as u128 * 60
            + self.max_minutes as u128;
        let steps = self.max_events_per_case.saturating_sub(1) as u128;
        let span_minutes = steps * max_delta_minutes;
        if span_minutes > MAX_WALK_SPAN_DAYS as u128 * 24 * 60 {
            return Err(ConfigError::invalid(format!(
                "a walk of {} events with deltas up to {}d {}h {}m spans more than {} days",
                self.max_events_per_case,
                self.max_days,
                self.max_hours,
                self.max_minutes,
                MAX_WALK_SPAN_DAYS
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GenerationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.events_range(), 3..=12);
    }

    #[test]
    fn test_inverted_event_bounds() {
        let config = GenerationConfig::default().with_events_per_case(5, 2);
        assert_eq!(
            config.validate(),
            Err(ConfigError::inverted("events_per_case", 5u32, 2u32))
        );
    }

    #[test]
    fn test_inverted_delta_bounds() {
        let config = GenerationConfig::default().with_deltas((0, 1), (5, 4), (0, 0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { name: "hours", .. })
        ));
    }

    #[test]
    fn test_single_event_walks_rejected() {
        let config = GenerationConfig::default().with_events_per_case(1, 4);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unbounded_timeframe_rejected() {
        let config = GenerationConfig::default().with_timeframe_years(u32::MAX);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = GenerationConfig::default().with_timeframe_years(MAX_TIMEFRAME_YEARS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_walk_span_beyond_calendar_rejected() {
        let config = GenerationConfig::default()
            .with_events_per_case(12, 12)
            .with_deltas((100_000_000, 100_000_000), (0, 0), (0, 0));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = GenerationConfig::default()
            .with_events_per_case(2, 2)
            .with_deltas((u32::MAX, u32::MAX), (u32::MAX, u32::MAX), (u32::MAX, u32::MAX));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_walk_span_at_limit_accepted() {
        let days_per_step = (MAX_WALK_SPAN_DAYS / 11) as u32;
        let config = GenerationConfig::default()
            .with_events_per_case(12, 12)
            .with_deltas((days_per_step, days_per_step), (0, 0), (0, 0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_cases_rejected() {
        let config = GenerationConfig::default().with_num_cases(0);
        assert_eq!(config.validate(), Err(ConfigError::NotPositive("num_cases")));
    }

    #[test]
    fn test_delta_bounds() {
        let config = GenerationConfig::default().with_deltas((1, 2), (3, 4), (5, 6));
        assert_eq!(
            config.min_delta(),
            Duration::days(1) + Duration::hours(3) + Duration::minutes(5)
        );
        assert_eq!(
            config.max_delta(),
            Duration::days(2) + Duration::hours(4) + Duration::minutes(6)
        );
    }

    #[test]
    fn test_max_events_for() {
        let config = GenerationConfig::default().with_events_per_case(2, 4);
        assert_eq!(config.max_events_for(3), 12);
        assert_eq!(config.timeframe(), Duration::days(2 * 365));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: GenerationConfig = serde_json::from_str(r#"{"num_cases": 5}"#).unwrap();
        assert_eq!(config.num_cases, 5);
        assert_eq!(config.max_events_per_case, 12);
        assert!(config.seed.is_none());
    }
}
