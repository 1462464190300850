//! Advisory progress notifications.
//!
//! Progress never influences generated content. Generators call the sink
//! after each item; sinks decide how often anything is emitted.

use std::fmt;
use tracing::info;

/// The generation stage being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Cases,
    Events,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Cases => write!(f, "Generating cases"),
            Stage::Events => write!(f, "Generating transitions"),
        }
    }
}

/// Receiver for progress notifications.
pub trait ProgressSink {
    /// `done` of `total` items of `stage` are complete.
    fn update(&mut self, stage: Stage, done: u64, total: u64);

    /// `stage` is complete.
    fn finish(&mut self, stage: Stage, total: u64);
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _stage: Stage, _done: u64, _total: u64) {}

    fn finish(&mut self, _stage: Stage, _total: u64) {}
}

/// Emits a log event every `interval` items and once on completion.
#[derive(Debug, Clone)]
pub struct LogProgress {
    interval: u64,
    emitted: u64,
}

impl LogProgress {
    /// Create a sink reporting every `interval` items. Zero reports only completion.
    pub fn new(interval: u64) -> Self {
        Self { interval, emitted: 0 }
    }

    /// Number of log events emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl ProgressSink for LogProgress {
    fn update(&mut self, stage: Stage, done: u64, total: u64) {
        if self.interval == 0 || done % self.interval != 0 || done >= total {
            return;
        }
        let percent = done as f64 / total as f64 * 100.0;
        info!(
            stage = %stage,
            done = %format_count(done),
            total = %format_count(total),
            percent = format!("{:.0}%", percent),
            "Progress"
        );
        self.emitted += 1;
    }

    fn finish(&mut self, stage: Stage, total: u64) {
        info!(stage = %stage, total = %format_count(total), percent = "100%", "Progress");
        self.emitted += 1;
    }
}

/// Render a count with a magnitude suffix, e.g. `1.5K` or `2M`.
pub fn format_count(num: u64) -> String {
    const UNITS: [(&str, f64); 5] = [("T", 1e12), ("B", 1e9), ("M", 1e6), ("K", 1e3), ("", 1.0)];

    let n = num as f64;
    for (suffix, threshold) in UNITS {
        if n >= threshold {
            let scaled = (n / threshold * 100.0).round() / 100.0;
            return format!("{}{}", scaled, suffix);
        }
    }
    num.to_string()
}
