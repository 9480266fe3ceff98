//! Corpus data model.
//!
//! Documents own their sentences, sentences own their tagged words, and
//! sequences hold non-owning references (ids) back to the sentence and
//! document they were cut from.

pub mod counts;
pub mod document;
pub mod sequence;

pub use counts::{BigramCount, DependencyCount, DocumentCount, WordCount};
pub use document::{Dependency, Document, Sentence, TaggedWord};
pub use sequence::Sequence;

/// Identifier of a persisted document.
pub type DocumentId = u64;

/// Identifier of a persisted sentence.
pub type SentenceId = u64;

/// Identifier of a vocabulary entry.
pub type WordId = u64;

/// Identifier of a dependency-relation entry.
pub type DependencyId = u64;
