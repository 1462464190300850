//! Error types for the fan-out coordinator.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracegen_core::{ConfigError, ShardId};
use tracegen_generator::GenerationError;

/// A worker that did not complete normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardFailure {
    /// The shard whose output is lost.
    pub shard: ShardId,
    /// Number of cases assigned to the shard.
    pub cases: usize,
    /// Panic message or cancellation reason.
    pub reason: String,
}

impl fmt::Display for ShardFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} cases): {}", self.shard, self.cases, self.reason)
    }
}

/// Errors that can occur while fanning out trace generation.
#[derive(Debug, Error)]
pub enum FanOutError {
    /// Invalid fan-out or generation parameters.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A generator could not be built for a shard.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// A worker failed and the policy is to fail fast.
    #[error("worker failed: {0}")]
    WorkerFailed(ShardFailure),

    /// The job did not finish within the configured timeout.
    #[error("fan-out timed out after {0:?}")]
    Timeout(Duration),

    /// The runtime could not join a worker task.
    #[error("worker task could not be joined: {0}")]
    Join(String),
}

/// Result type alias for fan-out operations.
pub type Result<T> = std::result::Result<T, FanOutError>;
