//! # tracegen-fanout
//!
//! Parallel trace generation. The case table is split into contiguous
//! shards, one per worker; every worker owns an independent
//! [`TraceGenerator`](tracegen_generator::TraceGenerator) with its own fork of
//! the vocabulary, and hands back its whole output as a single result.
//!
//! ## Protocol
//!
//! 1. Partition cases into `W` shards of `ceil(total / W)` cases.
//! 2. Reserve a disjoint event-id block per shard.
//! 3. Run each shard on the blocking pool.
//! 4. Join every worker; each produces exactly one terminal outcome,
//!    success or failure, tagged by shard.
//! 5. Concatenate shard outputs in shard order, optionally renumbering
//!    event ids contiguously.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tracegen_fanout::{FanOutConfig, FanOutCoordinator, FailurePolicy};
//!
//! let coordinator = FanOutCoordinator::new(
//!     FanOutConfig::new()
//!         .with_workers(4)
//!         .with_failure_policy(FailurePolicy::FailFast),
//! )?;
//!
//! let result = coordinator.run(&vocabulary, &generation, &cases).await?;
//! println!("{} events from {} shards", result.events.len(), result.shards.len());
//! ```

pub mod coordinator;
pub mod error;
pub mod partition;

pub use coordinator::{
    available_workers, FailurePolicy, FanOutConfig, FanOutCoordinator, FanOutResult, IdAllocation,
    ShardReport,
};
pub use error::{FanOutError, Result, ShardFailure};
pub use partition::{partition, plan_shards, shard_size, Shard};
