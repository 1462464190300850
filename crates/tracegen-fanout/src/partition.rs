//! Case partitioning and event-id reservation.

use tracegen_core::{CaseId, CaseRecord, ConfigError, EventId, GenerationConfig, ShardId};

/// Cases per shard: `ceil(total / workers)`.
pub fn shard_size(total: usize, workers: usize) -> usize {
    if workers == 0 {
        return 0;
    }
    (total + workers - 1) / workers
}

/// Split `items` into exactly `workers` contiguous, order-preserving pieces.
///
/// Every piece but the trailing ones holds [`shard_size`] items; trailing
/// pieces may be smaller or empty.
pub fn partition<T: Clone>(items: &[T], workers: usize) -> Result<Vec<Vec<T>>, ConfigError> {
    if workers == 0 {
        return Err(ConfigError::NotPositive("workers"));
    }

    let size = shard_size(items.len(), workers);
    let mut pieces: Vec<Vec<T>> = if size == 0 {
        Vec::new()
    } else {
        items.chunks(size).map(|chunk| chunk.to_vec()).collect()
    };
    pieces.resize_with(workers, Vec::new);
    Ok(pieces)
}

/// Work assigned to one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    pub id: ShardId,
    /// Cases in original order.
    pub cases: Vec<CaseId>,
    /// First id of the shard's reserved event-id block.
    pub first_event_id: EventId,
    /// Size of the reserved block: the shard's worst-case event count.
    pub reserved_ids: u64,
}

/// Partition `cases` and reserve a disjoint event-id block per shard.
///
/// Block `k` starts right after block `k - 1` and holds
/// `shard_len * max_events_per_case` ids, so shards can never collide.
pub fn plan_shards(
    cases: &[CaseRecord],
    workers: usize,
    config: &GenerationConfig,
) -> Result<Vec<Shard>, ConfigError> {
    let ids: Vec<CaseId> = cases.iter().map(|c| c.id).collect();
    let pieces = partition(&ids, workers)?;

    let mut next_block = EventId::FIRST.inner();
    let shards = pieces
        .into_iter()
        .enumerate()
        .map(|(index, cases)| {
            let reserved_ids = config.max_events_for(cases.len() as u64);
            let shard = Shard {
                id: ShardId(index),
                cases,
                first_event_id: EventId(next_block),
                reserved_ids,
            };
            next_block += reserved_ids;
            shard
        })
        .collect();

    Ok(shards)
}
