//! Tracegen Generator - Case and trace generation
//!
//! This crate turns a [`Vocabulary`] and a [`GenerationConfig`] into the two
//! tables of a process-mining dataset.
//!
//! # Core Concepts
//!
//! - [`Vocabulary`]: Schema plus sampling and transition oracle
//! - [`StaticVocabulary`]: Built-in vocabulary loaded from a JSON document
//! - [`generate_cases`]: Produces the case table
//! - [`TraceGenerator`]: Produces one bounded random walk per case
//! - [`ProgressSink`]: Advisory progress notifications
//!
//! [`GenerationConfig`]: tracegen_core::GenerationConfig

mod cases;
mod error;
mod progress;
mod static_vocab;
mod trace;
mod vocabulary;

pub use cases::generate_cases;
pub use error::{GenerationError, Result};
pub use progress::{format_count, LogProgress, NoProgress, ProgressSink, Stage};
pub use static_vocab::{StaticVocabulary, ValueSource, VocabularyDocument, WeightedTransition};
pub use trace::{TraceGenerator, Walk};
pub use vocabulary::Vocabulary;
