//! Text analysis for sequence indexing.
//!
//! This module holds the function-word (stop word) sets and the sequence
//! generator that cuts tagged sentences into indexable word spans.

pub mod sequence;
pub mod stop_words;

pub use sequence::SequenceGenerator;
pub use stop_words::StopWords;
