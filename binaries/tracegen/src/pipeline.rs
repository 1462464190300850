//! The generation pipeline: cases, events, files.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};

use tracegen_core::{CaseRecord, EventRecord, RunId, TableKind};
use tracegen_fanout::{FanOutCoordinator, ShardFailure};
use tracegen_generator::{
    format_count, generate_cases, LogProgress, NoProgress, ProgressSink, StaticVocabulary,
    TraceGenerator, Vocabulary,
};
use tracegen_output::{DelimitedWriter, SchemaWriter, SqlInsertWriter, TableDefinition};

use crate::config::TracegenConfig;

/// Vocabulary used when no document is configured.
pub const DEFAULT_VOCABULARY: &str = include_str!("../vocabulary/default.json");

/// Outcome of one run.
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: RunId,
    pub cases: usize,
    pub events: usize,
    pub workers: usize,
    pub lost_shards: Vec<ShardFailure>,
    pub files: Vec<PathBuf>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Log the summary with human-readable counts.
    pub fn log(&self) {
        info!(
            run_id = %self.run_id,
            cases = %format_count(self.cases as u64),
            events = %format_count(self.events as u64),
            workers = self.workers,
            files = self.files.len(),
            elapsed = ?self.elapsed,
            "Generation complete"
        );
        for failure in &self.lost_shards {
            warn!(shard = %failure.shard, cases = failure.cases, reason = %failure.reason, "Shard output missing");
        }
    }
}

/// Load and validate the configured vocabulary.
pub fn load_vocabulary(config: &TracegenConfig) -> Result<StaticVocabulary> {
    let seed = config.vocabulary_seed().unwrap_or_else(rand::random);

    let vocabulary = match config.vocabulary.path {
        Some(ref path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read vocabulary from {:?}", path))?;
            StaticVocabulary::from_json(&json, seed)
                .with_context(|| format!("Invalid vocabulary {:?}", path))?
        }
        None => StaticVocabulary::from_json(DEFAULT_VOCABULARY, seed)
            .context("Invalid bundled vocabulary")?,
    };

    info!(vocabulary = vocabulary.name(), seed, "Vocabulary loaded");
    Ok(vocabulary)
}

/// Run the whole pipeline.
pub async fn run(config: &TracegenConfig, mut vocabulary: StaticVocabulary) -> Result<RunSummary> {
    let run_id = RunId::new();
    let start = Instant::now();
    info!(run_id = %run_id, cases = config.generation.num_cases, "Starting run");

    let mut progress = progress_sink(config);
    let cases = generate_cases(&mut vocabulary, config.generation.num_cases, progress.as_mut())
        .context("Case generation failed")?;

    let (events, workers, lost_shards) = if config.fanout.single_threaded {
        let mut generator = TraceGenerator::new(vocabulary.fork(1), config.generation.clone())
            .context("Trace generation failed")?
            .with_stream(1);
        let events = generator.generate(&cases, progress.as_mut());
        (events, 1, Vec::new())
    } else {
        let coordinator = FanOutCoordinator::new(config.fanout.to_fanout_config())
            .context("Invalid fan-out configuration")?;
        let result = coordinator
            .run(&vocabulary, &config.generation, &cases)
            .await
            .context("Trace generation failed")?;
        (result.events, coordinator.workers(), result.lost_shards)
    };

    let files = write_tables(config, &vocabulary, &cases, &events)?;

    Ok(RunSummary {
        run_id,
        cases: cases.len(),
        events: events.len(),
        workers,
        lost_shards,
        files,
        elapsed: start.elapsed(),
    })
}

fn progress_sink(config: &TracegenConfig) -> Box<dyn ProgressSink> {
    if config.progress.enabled {
        Box::new(LogProgress::new(config.progress.interval))
    } else {
        Box::new(NoProgress)
    }
}

/// Write every configured output file. Returns the written paths.
pub fn write_tables(
    config: &TracegenConfig,
    vocabulary: &StaticVocabulary,
    cases: &[CaseRecord],
    events: &[EventRecord],
) -> Result<Vec<PathBuf>> {
    let output = &config.output;
    let mut files = Vec::new();

    if output.format.writes_sql() {
        let dir = output.sql_dir();
        let writer = SqlInsertWriter::new().with_batch_size(output.batch_size);

        let path = dir.join(format!("{}.sql", output.cases_table));
        writer
            .write_to_file(&output.cases_table, cases, &path)
            .with_context(|| format!("Failed to write {:?}", path))?;
        files.push(path);

        let path = dir.join(format!("{}.sql", output.events_table));
        writer
            .write_to_file(&output.events_table, events, &path)
            .with_context(|| format!("Failed to write {:?}", path))?;
        files.push(path);

        if output.schema_file {
            let cases_schema = vocabulary.schema(TableKind::Cases);
            let events_schema = vocabulary.schema(TableKind::Events);
            let case_key = cases_schema
                .primary_key()
                .map(|f| f.display_name.as_str())
                .unwrap_or("id");

            let tables = [
                TableDefinition::new(&output.cases_table, cases_schema)
                    .with_sample(cases.first().map(|c| &c.record)),
                TableDefinition::new(&output.events_table, events_schema)
                    .with_sample(events.first().map(|e| &e.record))
                    .references(&output.cases_table, case_key),
            ];

            let path = dir.join("schema.sql");
            SchemaWriter::new()
                .write_to_file(&tables, &path)
                .with_context(|| format!("Failed to write {:?}", path))?;
            files.push(path);
        }
    }

    if output.format.writes_csv() {
        let dir = output.csv_dir();
        let writer = DelimitedWriter::new().with_delimiter(output.delimiter);

        let path = dir.join(format!("{}.csv", output.cases_table));
        writer
            .write_to_file(&output.cases_table, cases, &path)
            .with_context(|| format!("Failed to write {:?}", path))?;
        files.push(path);

        let path = dir.join(format!("{}.csv", output.events_table));
        writer
            .write_to_file(&output.events_table, events, &path)
            .with_context(|| format!("Failed to write {:?}", path))?;
        files.push(path);
    }

    info!(files = files.len(), directory = %output.directory.display(), "Output written");
    Ok(files)
}
