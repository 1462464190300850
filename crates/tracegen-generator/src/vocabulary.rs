//! The vocabulary contract.

use tracegen_core::{TableKind, TableSchema, Value};

/// Schema plus sampling and transition oracle.
///
/// The generators never look inside a vocabulary: value distributions and
/// transition weights are whatever the implementation decides. The only
/// assumption is that [`Vocabulary::next_state`] and [`Vocabulary::sample`]
/// depend on their argument plus the vocabulary's own randomness.
///
/// # Isolation
///
/// A fan-out job gives every worker its own copy obtained through
/// [`Vocabulary::fork`]. Forks must not share mutable state with each other
/// or with the original.
///
/// # Determinism
///
/// Implementations should be deterministic given the same seed. Use
/// [`Vocabulary::reseed`] to reinitialize the random state for replay.
pub trait Vocabulary: Send {
    /// Ordered column list of `table`.
    fn schema(&self, table: TableKind) -> &TableSchema;

    /// Label of the first step of every walk.
    fn start_marker(&self) -> &str;

    /// Label of the last step of every walk.
    fn end_marker(&self) -> &str;

    /// A plausible value for the field whose semantic name is `key`.
    fn sample(&mut self, key: &str) -> Value;

    /// A successor of `previous`. May return the end marker.
    fn next_state(&mut self, previous: &str) -> String;

    /// Reinitialize the random state.
    fn reseed(&mut self, seed: u64);

    /// An independent copy drawing from its own random stream.
    ///
    /// Forks with the same seed and stream produce the same sequence.
    fn fork(&self, stream: u64) -> Self
    where
        Self: Sized;

    /// Get the name of this vocabulary for logging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
