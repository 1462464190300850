//! Tracegen configuration.
//!
//! Configuration is read from a TOML file, then overridden by CLI flags.
//! Every section falls back to its defaults when absent.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracegen_core::GenerationConfig;
use tracegen_fanout::{available_workers, FailurePolicy, FanOutConfig, IdAllocation};

/// Tracegen configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TracegenConfig {
    /// Case count, walk bounds, time deltas and seed.
    pub generation: GenerationConfig,

    /// Vocabulary source.
    pub vocabulary: VocabularyConfig,

    /// Parallel generation.
    pub fanout: FanOutSettings,

    /// Output files.
    pub output: OutputConfig,

    /// Progress reporting.
    pub progress: ProgressConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Vocabulary configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    /// JSON vocabulary document. The bundled vocabulary is used when unset.
    pub path: Option<PathBuf>,

    /// Sampler seed. Derived from the generation seed when unset.
    pub seed: Option<u64>,
}

/// Fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FanOutSettings {
    /// Worker count. Defaults to the available parallelism.
    pub workers: Option<usize>,

    /// Generate events on the calling thread with progress reporting.
    pub single_threaded: bool,

    /// Reaction to a failed worker.
    pub failure_policy: FailurePolicy,

    /// Event-id strategy across shards.
    pub id_allocation: IdAllocation,

    /// Overall deadline in seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for FanOutSettings {
    fn default() -> Self {
        Self {
            workers: None,
            single_threaded: false,
            failure_policy: FailurePolicy::FailFast,
            id_allocation: IdAllocation::Reserved,
            timeout_secs: None,
        }
    }
}

impl FanOutSettings {
    /// Effective worker count.
    pub fn workers(&self) -> usize {
        self.workers.unwrap_or_else(available_workers)
    }

    /// Returns the timeout as a Duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Build the coordinator configuration.
    pub fn to_fanout_config(&self) -> FanOutConfig {
        let mut config = FanOutConfig::new()
            .with_workers(self.workers())
            .with_failure_policy(self.failure_policy)
            .with_id_allocation(self.id_allocation);
        if let Some(timeout) = self.timeout() {
            config = config.with_timeout(timeout);
        }
        config
    }
}

/// Which files a run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Sql,
    Csv,
    Both,
}

impl OutputFormat {
    pub fn writes_sql(self) -> bool {
        matches!(self, OutputFormat::Sql | OutputFormat::Both)
    }

    pub fn writes_csv(self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root output directory. SQL goes to `sql/`, delimited text to `csv/`.
    pub directory: PathBuf,

    /// Formats to write.
    pub format: OutputFormat,

    /// Name of the case table.
    pub cases_table: String,

    /// Name of the event table.
    pub events_table: String,

    /// Rows per `INSERT` statement.
    pub batch_size: usize,

    /// Field separator for delimited output.
    pub delimiter: char,

    /// Also write `CREATE TABLE` statements when SQL output is enabled.
    pub schema_file: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            format: OutputFormat::Both,
            cases_table: "cases".to_string(),
            events_table: "events".to_string(),
            batch_size: 1000,
            delimiter: ',',
            schema_file: true,
        }
    }
}

impl OutputConfig {
    pub fn sql_dir(&self) -> PathBuf {
        self.directory.join("sql")
    }

    pub fn csv_dir(&self) -> PathBuf {
        self.directory.join("csv")
    }
}

/// Progress configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Whether to log progress.
    pub enabled: bool,

    /// Items between two progress events.
    pub interval: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 10_000,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Log format (pretty, json, compact).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl TracegenConfig {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merges CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &super::CliArgs) {
        if let Some(cases) = args.cases {
            self.generation.num_cases = cases;
        }
        if let Some(seed) = args.seed {
            self.generation.seed = Some(seed);
        }
        if let Some(ref path) = args.vocabulary {
            self.vocabulary.path = Some(path.clone());
        }
        if let Some(workers) = args.workers {
            self.fanout.workers = Some(workers);
        }
        if args.single_threaded {
            self.fanout.single_threaded = true;
        }
        if let Some(ref dir) = args.output_dir {
            self.output.directory = dir.clone();
        }
        if let Some(format) = args.format {
            self.output.format = format;
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
        if args.json_logs {
            self.logging.format = "json".to_string();
        }
    }

    /// Sampler seed: explicit, or derived from the generation seed so the
    /// vocabulary and the walk do not draw from the same stream.
    pub fn vocabulary_seed(&self) -> Option<u64> {
        self.vocabulary
            .seed
            .or_else(|| self.generation.seed.map(|s| s ^ 0x9E37_79B9_7F4A_7C15))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.generation.validate()?;

        if self.fanout.workers == Some(0) {
            anyhow::bail!("Worker count must be positive");
        }
        if self.fanout.timeout_secs == Some(0) {
            anyhow::bail!("Fan-out timeout must be positive");
        }

        if self.output.batch_size == 0 {
            anyhow::bail!("Output batch size must be positive");
        }
        if matches!(self.output.delimiter, '"' | '\n' | '\r') {
            anyhow::bail!("Invalid delimiter: {:?}", self.output.delimiter);
        }
        if self.output.cases_table.is_empty() || self.output.events_table.is_empty() {
            anyhow::bail!("Table names must not be empty");
        }
        if self.output.cases_table == self.output.events_table {
            anyhow::bail!(
                "Case and event tables share the name '{}'",
                self.output.cases_table
            );
        }

        if self.progress.enabled && self.progress.interval == 0 {
            anyhow::bail!("Progress interval must be positive");
        }

        if let Some(ref path) = self.vocabulary.path {
            if !path.exists() {
                anyhow::bail!("Vocabulary file not found: {:?}", path);
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }
}
