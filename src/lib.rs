//! # Phalanx
//!
//! A resumable corpus-processing pipeline for Rust.
//!
//! ## Features
//!
//! - Stage-by-stage processing: metadata extraction, grammatical parsing,
//!   sequence indexing and statistics aggregation
//! - Crash-safe resume from a checksummed progress log
//! - Word-sequence generation with function-word stripping
//! - Batched statistics: counts, bigrams, TF-IDF and Lin similarity
//! - Pluggable storage backends

pub mod analysis;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod parse;
pub mod pipeline;
pub mod progress;
pub mod stats;
pub mod storage;
pub mod store;

pub mod prelude {
    pub use crate::analysis::{SequenceGenerator, StopWords};
    pub use crate::config::PipelineConfig;
    pub use crate::corpus::{Document, Sentence, Sequence, TaggedWord};
    pub use crate::error::{PhalanxError, Result};
    pub use crate::pipeline::{CollectionProcessor, ProcessReport, Stage};
    pub use crate::progress::{Checkpoint, ProgressLog};
    pub use crate::store::{CorpusDatabase, CorpusStore};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
