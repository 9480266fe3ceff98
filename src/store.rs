//! Corpus persistence.
//!
//! [`CorpusStore`] is the persistence collaborator of the pipeline: it keeps
//! documents, sentences, sequences and every statistic, and exposes the
//! grouped rows the statistics aggregator iterates over. Changes become
//! durable only on [`CorpusStore::commit`]; the pipeline commits before it
//! writes each checkpoint so a checkpoint never points past durable data.

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::corpus::{
    BigramCount, DependencyCount, DependencyId, Document, DocumentCount, DocumentId, Sentence,
    SentenceId, Sequence, WordCount, WordId,
};
use crate::error::Result;

pub mod database;

pub use database::CorpusDatabase;

/// Distinct-document and distinct-sentence counts of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccurrenceRow {
    pub id: u64,
    pub document_count: u64,
    pub sentence_count: u64,
}

/// Occurrences of two words appearing next to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BigramRow {
    pub first: WordId,
    pub second: WordId,
    pub sentence_count: u64,
    pub frequency: u64,
}

/// Number of occurrences of a word in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermFrequencyRow {
    pub word_id: WordId,
    pub document_id: DocumentId,
    pub frequency: u64,
}

/// A grammatical context a word occurs in: the relation, the word on the
/// other end, and whether this word is the governor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Feature {
    pub relation: String,
    pub other: WordId,
    pub governs: bool,
}

/// Number of times a word occurs in a grammatical context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRow {
    pub word_id: WordId,
    pub feature: Feature,
    pub frequency: u64,
}

/// Persistence collaborator of the pipeline.
///
/// Rows are returned in ascending id order.
pub trait CorpusStore: Send + Sync + Debug {
    // Documents

    /// Persist a newly extracted document and return its id.
    fn create_new_document(&self, document: Document, file_sequence_number: u64)
    -> Result<DocumentId>;

    /// Drop documents created from file `file_sequence_number` since the last
    /// commit, and forget that file as extracted. Returns the number of
    /// documents removed.
    fn discard_partial_file(&self, file_sequence_number: u64) -> Result<usize>;

    /// Remember that file `file_name` was fully extracted as number
    /// `file_sequence_number`. Committed together with its documents.
    fn record_extracted_file(&self, file_sequence_number: u64, file_name: &str) -> Result<()>;

    /// Every recorded extracted file, keyed by file number.
    fn extracted_files(&self) -> Result<BTreeMap<u64, String>>;

    fn list_document_ids(&self) -> Result<Vec<DocumentId>>;

    fn get_document(&self, id: DocumentId) -> Result<Document>;

    /// Store a parsed document, assigning ids to its sentences.
    fn save_document(&self, document: Document) -> Result<()>;

    /// Build the word and dependency tables from the parsed sentences.
    fn finish_grammatical_processing(&self) -> Result<()>;

    // Sequences

    fn list_unindexed_sentence_ids(&self) -> Result<Vec<SentenceId>>;

    fn get_sentence(&self, id: SentenceId) -> Result<Sentence>;

    /// Store the sequences of a sentence, replacing any earlier set.
    fn index_sequences(&self, sentence_id: SentenceId, sequences: Vec<Sequence>) -> Result<()>;

    /// Build the phrase table from the indexed sequences.
    fn finish_indexing_sequences(&self) -> Result<()>;

    // Statistics

    fn word_rows(&self) -> Result<Vec<OccurrenceRow>>;

    fn set_word_count(&self, id: WordId, count: WordCount) -> Result<()>;

    fn dependency_rows(&self) -> Result<Vec<OccurrenceRow>>;

    fn set_dependency_count(&self, id: DependencyId, count: DependencyCount) -> Result<()>;

    fn set_document_count(&self, id: DocumentId, count: DocumentCount) -> Result<()>;

    fn bigram_rows(&self) -> Result<Vec<BigramRow>>;

    fn set_bigram_count(&self, first: WordId, second: WordId, count: BigramCount) -> Result<()>;

    fn term_frequency_rows(&self) -> Result<Vec<TermFrequencyRow>>;

    fn set_tfidf(&self, word_id: WordId, document_id: DocumentId, score: f64) -> Result<()>;

    fn feature_rows(&self) -> Result<Vec<FeatureRow>>;

    fn set_similarity(&self, first: WordId, second: WordId, score: f64) -> Result<()>;

    // Lifecycle

    /// Make every change since the previous commit durable.
    fn commit(&self) -> Result<()>;

    /// Wipe all corpus state, durably.
    fn reset(&self) -> Result<()>;
}
