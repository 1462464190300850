//! Fan-out coordinator.
//!
//! The coordinator only dispatches and collects. Generation happens on the
//! blocking pool, one task per shard, each owning its generator, its
//! vocabulary fork and its slice of case ids.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use tracegen_core::{
    CaseRecord, ConfigError, EventId, EventRecord, GenerationConfig, ShardId, TableKind,
};
use tracegen_generator::{TraceGenerator, Vocabulary};

use crate::error::{FanOutError, Result, ShardFailure};
use crate::partition::{plan_shards, Shard};

/// What to do when a worker fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Cancel the remaining workers and return the failure.
    #[default]
    FailFast,
    /// Keep the surviving shards and report the lost ones.
    Continue,
}

/// How event ids are made unique across shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdAllocation {
    /// Keep the disjoint per-shard blocks. Ids are unique; gaps are possible.
    #[default]
    Reserved,
    /// Renumber `1..=n` in aggregated order after all shards complete.
    Renumber,
}

/// Configuration for a fan-out job.
#[derive(Debug, Clone)]
pub struct FanOutConfig {
    /// Number of workers. Defaults to the available parallelism.
    pub workers: usize,

    /// Reaction to a failed worker.
    pub failure_policy: FailurePolicy,

    /// Event-id strategy.
    pub id_allocation: IdAllocation,

    /// Overall deadline for the job.
    pub timeout: Option<Duration>,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            workers: available_workers(),
            failure_policy: FailurePolicy::default(),
            id_allocation: IdAllocation::default(),
            timeout: None,
        }
    }
}

impl FanOutConfig {
    /// Create a new fan-out configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the event-id strategy.
    pub fn with_id_allocation(mut self, allocation: IdAllocation) -> Self {
        self.id_allocation = allocation;
        self
    }

    /// Set the overall timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NotPositive("workers"));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(ConfigError::NotPositive("timeout"));
        }
        Ok(())
    }
}

/// Summary of one successful shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardReport {
    pub shard: ShardId,
    pub cases: usize,
    pub events: usize,
    /// First id of the shard's reserved block.
    pub first_event_id: EventId,
    pub elapsed: Duration,
}

/// Aggregated output of a fan-out job.
#[derive(Debug, Clone)]
pub struct FanOutResult {
    /// Shard outputs concatenated in shard order.
    pub events: Vec<EventRecord>,
    /// Completed shards in shard order.
    pub shards: Vec<ShardReport>,
    /// Shards whose output is missing. Empty unless the policy is
    /// [`FailurePolicy::Continue`].
    pub lost_shards: Vec<ShardFailure>,
}

impl FanOutResult {
    /// Whether every shard completed.
    pub fn is_complete(&self) -> bool {
        self.lost_shards.is_empty()
    }
}

/// Terminal outcome of one worker.
type WorkerOutcome = (ShardId, std::result::Result<ShardOutput, ShardFailure>);

struct ShardOutput {
    events: Vec<EventRecord>,
    report: ShardReport,
}

/// Runs trace generation across isolated shard workers.
#[derive(Debug, Clone)]
pub struct FanOutCoordinator {
    config: FanOutConfig,
}

impl FanOutCoordinator {
    /// Create a coordinator.
    pub fn new(config: FanOutConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Number of workers a job will launch.
    pub fn workers(&self) -> usize {
        self.config.workers
    }

    /// Generate the event table for `cases`.
    ///
    /// Every worker receives `vocabulary.fork(shard + 1)` and a generator on
    /// the matching random stream, so a seeded run is reproducible for a
    /// fixed worker count.
    ///
    /// # Errors
    ///
    /// Configuration and schema problems are reported before any worker
    /// starts. Worker failures are reported per the failure policy; a
    /// timeout cancels all outstanding workers.
    pub async fn run<V>(
        &self,
        vocabulary: &V,
        generation: &GenerationConfig,
        cases: &[CaseRecord],
    ) -> Result<FanOutResult>
    where
        V: Vocabulary + 'static,
    {
        generation.validate()?;
        let start = Instant::now();
        let now = Utc::now().naive_utc();
        let shards = plan_shards(cases, self.config.workers, generation)?;

        // Build every generator up front so structural errors surface before
        // any work is dispatched.
        let mut jobs = Vec::with_capacity(shards.len());
        for shard in shards {
            let generator = self.shard_generator(vocabulary, generation, &shard, now)?;
            jobs.push((shard, generator));
        }

        info!(
            workers = self.config.workers,
            cases = cases.len(),
            vocabulary = vocabulary.name(),
            "Starting fan-out"
        );

        let cancelled = Arc::new(AtomicBool::new(false));
        let mut set = JoinSet::new();
        let shard_count = jobs.len();
        for (shard, generator) in jobs {
            let cancelled = Arc::clone(&cancelled);
            set.spawn_blocking(move || run_worker(shard, generator, &cancelled));
        }

        let mut outputs: Vec<Option<ShardOutput>> = (0..shard_count).map(|_| None).collect();
        let mut lost_shards = Vec::new();
        let deadline = self.config.timeout.map(|t| tokio::time::Instant::now() + t);

        while !set.is_empty() {
            let joined = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, set.join_next()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        let timeout = self.config.timeout.unwrap_or_default();
                        error!(timeout = ?timeout, pending = set.len(), "Fan-out timed out, cancelling workers");
                        cancel_all(&cancelled, &mut set);
                        return Err(FanOutError::Timeout(timeout));
                    }
                },
                None => set.join_next().await,
            };

            let Some(joined) = joined else { break };
            let (shard, outcome) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    cancel_all(&cancelled, &mut set);
                    return Err(FanOutError::Join(e.to_string()));
                }
            };

            match outcome {
                Ok(output) => {
                    debug!(
                        shard = %shard,
                        cases = output.report.cases,
                        events = output.report.events,
                        elapsed = ?output.report.elapsed,
                        "Worker completed"
                    );
                    outputs[shard.0] = Some(output);
                }
                Err(failure) => match self.config.failure_policy {
                    FailurePolicy::FailFast => {
                        error!(shard = %shard, reason = %failure.reason, "Worker failed, cancelling remaining workers");
                        cancel_all(&cancelled, &mut set);
                        return Err(FanOutError::WorkerFailed(failure));
                    }
                    FailurePolicy::Continue => {
                        warn!(shard = %shard, reason = %failure.reason, "Worker failed, continuing without its shard");
                        lost_shards.push(failure);
                    }
                },
            }
        }

        lost_shards.sort_by_key(|f| f.shard);
        let mut result = aggregate(outputs, lost_shards);

        if self.config.id_allocation == IdAllocation::Renumber {
            renumber(&mut result.events, vocabulary)?;
        }

        info!(
            events = result.events.len(),
            shards = result.shards.len(),
            lost = result.lost_shards.len(),
            duration = ?start.elapsed(),
            "Fan-out complete"
        );

        Ok(result)
    }

    fn shard_generator<V: Vocabulary>(
        &self,
        vocabulary: &V,
        generation: &GenerationConfig,
        shard: &Shard,
        now: NaiveDateTime,
    ) -> Result<TraceGenerator<V>> {
        let stream = shard.id.0 as u64 + 1;
        let generator = TraceGenerator::new(vocabulary.fork(stream), generation.clone())?
            .with_stream(stream)
            .with_first_id(shard.first_event_id)
            .with_now(now);
        Ok(generator)
    }
}

/// Body of one worker. Every path ends in exactly one outcome, panics
/// included.
fn run_worker<V: Vocabulary>(
    shard: Shard,
    mut generator: TraceGenerator<V>,
    cancelled: &AtomicBool,
) -> WorkerOutcome {
    let started = Instant::now();
    let id = shard.id;
    let cases = shard.cases.len();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut events = Vec::new();
        for &case_id in &shard.cases {
            if cancelled.load(Ordering::Relaxed) {
                return Err("cancelled".to_string());
            }
            events.extend(generator.generate_case(case_id));
        }
        Ok(events)
    }));

    let outcome = match result {
        Ok(Ok(events)) => Ok(ShardOutput {
            report: ShardReport {
                shard: id,
                cases,
                events: events.len(),
                first_event_id: shard.first_event_id,
                elapsed: started.elapsed(),
            },
            events,
        }),
        Ok(Err(reason)) => Err(ShardFailure { shard: id, cases, reason }),
        Err(payload) => Err(ShardFailure {
            shard: id,
            cases,
            reason: panic_message(payload.as_ref()),
        }),
    };

    (id, outcome)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}

/// Signal cancellation and let go of every outstanding worker.
///
/// Blocking tasks cannot be aborted once running, so the set is detached
/// instead of awaited. Workers observe the flag before their next case and
/// their output is dropped.
fn cancel_all(cancelled: &AtomicBool, set: &mut JoinSet<WorkerOutcome>) {
    cancelled.store(true, Ordering::Relaxed);
    set.abort_all();
    set.detach_all();
}

fn aggregate(outputs: Vec<Option<ShardOutput>>, lost_shards: Vec<ShardFailure>) -> FanOutResult {
    let total = outputs.iter().flatten().map(|o| o.events.len()).sum();
    let mut events = Vec::with_capacity(total);
    let mut shards = Vec::new();

    for output in outputs.into_iter().flatten() {
        events.extend(output.events);
        shards.push(output.report);
    }

    FanOutResult {
        events,
        shards,
        lost_shards,
    }
}

fn renumber<V: Vocabulary>(events: &mut [EventRecord], vocabulary: &V) -> Result<()> {
    let schema = vocabulary.schema(TableKind::Events);
    let key = schema
        .primary_key()
        .map(|f| f.display_name.clone())
        .ok_or_else(|| ConfigError::invalid("events schema has no primary key to renumber"))?;

    let mut id = EventId::FIRST;
    for event in events.iter_mut() {
        event.renumber(id, &key);
        id = id.next();
    }
    Ok(())
}

/// Number of processing units available to this process.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}
