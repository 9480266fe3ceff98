//! Statistics aggregation.
//!
//! Every aggregation queries its rows from the store, overwrites one record
//! per row and commits every `interval` records, with a final commit for a
//! non-empty remainder. Counts are overwritten rather than incremented, so
//! a rerun after a failure recomputes the whole statistic from scratch.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use phalanx::stats::StatisticsAggregator;
//! use phalanx::store::CorpusDatabase;
//! use phalanx::storage::memory::{MemoryStorage, MemoryStorageConfig};
//!
//! # fn main() -> phalanx::error::Result<()> {
//! let store = CorpusDatabase::open(Arc::new(MemoryStorage::new(MemoryStorageConfig::default())))?;
//! let aggregator = StatisticsAggregator::new(500)?;
//! assert_eq!(aggregator.count_words(&store)?, 0);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use ahash::AHashMap;
use log::{debug, info};

use crate::config::StatisticsConfig;
use crate::corpus::{BigramCount, DependencyCount, DocumentCount, WordCount, WordId};
use crate::error::{PhalanxError, Result};
use crate::store::{CorpusStore, Feature};

pub mod scoring;

pub use scoring::{FeatureVector, LinSimilarity, SimilarityMeasure, TermWeighting, TfIdf};

/// One aggregated statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    WordCounts,
    DependencyCounts,
    DocumentCounts,
    BigramCounts,
    Tfidf,
    LinSimilarity,
}

impl Statistic {
    pub const ALL: [Statistic; 6] = [
        Statistic::WordCounts,
        Statistic::DependencyCounts,
        Statistic::DocumentCounts,
        Statistic::BigramCounts,
        Statistic::Tfidf,
        Statistic::LinSimilarity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Statistic::WordCounts => "word counts",
            Statistic::DependencyCounts => "dependency counts",
            Statistic::DocumentCounts => "document counts",
            Statistic::BigramCounts => "bigram counts",
            Statistic::Tfidf => "tf-idf",
            Statistic::LinSimilarity => "lin similarity",
        }
    }

    /// Whether `config` enables this statistic.
    pub fn is_enabled(&self, config: &StatisticsConfig) -> bool {
        match self {
            Statistic::WordCounts => config.word_counts,
            Statistic::DependencyCounts => config.dependency_counts,
            Statistic::DocumentCounts => config.document_counts,
            Statistic::BigramCounts => config.bigram_counts,
            Statistic::Tfidf => config.tfidf,
            Statistic::LinSimilarity => config.lin_similarity,
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Commits the store every `interval` recorded items.
struct BatchCommitter<'a, S: CorpusStore + ?Sized> {
    store: &'a S,
    interval: usize,
    pending: usize,
    recorded: usize,
}

impl<'a, S: CorpusStore + ?Sized> BatchCommitter<'a, S> {
    fn new(store: &'a S, interval: usize) -> Self {
        BatchCommitter {
            store,
            interval,
            pending: 0,
            recorded: 0,
        }
    }

    fn record(&mut self) -> Result<()> {
        self.pending += 1;
        self.recorded += 1;
        if self.pending == self.interval {
            self.store.commit()?;
            debug!("Committed batch of {} ({} total)", self.pending, self.recorded);
            self.pending = 0;
        }
        Ok(())
    }

    /// Commit the remainder and return the number of recorded items.
    fn finish(self) -> Result<usize> {
        if self.pending > 0 {
            self.store.commit()?;
            debug!("Committed final batch of {}", self.pending);
        }
        Ok(self.recorded)
    }
}

/// Recomputes aggregate statistics in bounded batches.
#[derive(Debug)]
pub struct StatisticsAggregator {
    interval: usize,
    min_similarity: f64,
    weighting: Box<dyn TermWeighting>,
    similarity: Box<dyn SimilarityMeasure>,
}

impl StatisticsAggregator {
    /// Create an aggregator committing every `interval` records.
    pub fn new(interval: usize) -> Result<Self> {
        if interval == 0 {
            return Err(PhalanxError::config("commit interval must be at least 1"));
        }
        Ok(StatisticsAggregator {
            interval,
            min_similarity: 0.0,
            weighting: Box::new(TfIdf),
            similarity: Box::new(LinSimilarity),
        })
    }

    pub fn from_config(config: &StatisticsConfig) -> Result<Self> {
        Ok(Self::new(config.commit_interval)?.with_min_similarity(config.min_similarity))
    }

    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    pub fn with_weighting(mut self, weighting: Box<dyn TermWeighting>) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_similarity(mut self, similarity: Box<dyn SimilarityMeasure>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn interval(&self) -> usize {
        self.interval
    }

    /// Run one statistic and return the number of records written.
    pub fn run<S: CorpusStore + ?Sized>(&self, statistic: Statistic, store: &S) -> Result<usize> {
        info!("Calculating {statistic}");
        let written = match statistic {
            Statistic::WordCounts => self.count_words(store),
            Statistic::DependencyCounts => self.count_dependencies(store),
            Statistic::DocumentCounts => self.count_documents(store),
            Statistic::BigramCounts => self.count_bigrams(store),
            Statistic::Tfidf => self.calculate_tfidfs(store),
            Statistic::LinSimilarity => self.calculate_lin_similarities(store),
        }?;
        info!("Finished {statistic}: {written} records");
        Ok(written)
    }

    pub fn count_words<S: CorpusStore + ?Sized>(&self, store: &S) -> Result<usize> {
        let mut batch = BatchCommitter::new(store, self.interval);
        for row in store.word_rows()? {
            store.set_word_count(
                row.id,
                WordCount {
                    document_count: row.document_count,
                    sentence_count: row.sentence_count,
                },
            )?;
            batch.record()?;
        }
        batch.finish()
    }

    pub fn count_dependencies<S: CorpusStore + ?Sized>(&self, store: &S) -> Result<usize> {
        let mut batch = BatchCommitter::new(store, self.interval);
        for row in store.dependency_rows()? {
            store.set_dependency_count(
                row.id,
                DependencyCount {
                    document_count: row.document_count,
                    sentence_count: row.sentence_count,
                },
            )?;
            batch.record()?;
        }
        batch.finish()
    }

    pub fn count_documents<S: CorpusStore + ?Sized>(&self, store: &S) -> Result<usize> {
        let mut batch = BatchCommitter::new(store, self.interval);
        for id in store.list_document_ids()? {
            let document = store.get_document(id)?;
            store.set_document_count(
                id,
                DocumentCount {
                    sentence_count: document.sentences.len() as u64,
                },
            )?;
            batch.record()?;
        }
        batch.finish()
    }

    pub fn count_bigrams<S: CorpusStore + ?Sized>(&self, store: &S) -> Result<usize> {
        let mut batch = BatchCommitter::new(store, self.interval);
        for row in store.bigram_rows()? {
            store.set_bigram_count(
                row.first,
                row.second,
                BigramCount {
                    sentence_count: row.sentence_count,
                    frequency: row.frequency,
                },
            )?;
            batch.record()?;
        }
        batch.finish()
    }

    pub fn calculate_tfidfs<S: CorpusStore + ?Sized>(&self, store: &S) -> Result<usize> {
        let document_total = store.list_document_ids()?.len() as u64;
        let rows = store.term_frequency_rows()?;

        let mut document_frequencies: AHashMap<WordId, u64> = AHashMap::new();
        for row in &rows {
            *document_frequencies.entry(row.word_id).or_default() += 1;
        }

        let mut batch = BatchCommitter::new(store, self.interval);
        for row in rows {
            let df = document_frequencies.get(&row.word_id).copied().unwrap_or(0);
            let score = self.weighting.weight(row.frequency, df, document_total);
            store.set_tfidf(row.word_id, row.document_id, score)?;
            batch.record()?;
        }
        batch.finish()
    }

    /// Score every pair of words sharing at least one grammatical context.
    ///
    /// Commits every `interval` words; a pair is stored once, keyed by the
    /// lower word id.
    pub fn calculate_lin_similarities<S: CorpusStore + ?Sized>(&self, store: &S) -> Result<usize> {
        let vectors = feature_vectors(store)?;

        let mut contexts: AHashMap<&Feature, Vec<WordId>> = AHashMap::new();
        for (&word_id, vector) in &vectors {
            for feature in vector.keys() {
                contexts.entry(feature).or_default().push(word_id);
            }
        }

        let mut batch = BatchCommitter::new(store, self.interval);
        let mut stored = 0;
        for (&word_id, vector) in &vectors {
            let mut candidates: Vec<WordId> = vector
                .keys()
                .filter_map(|feature| contexts.get(feature))
                .flatten()
                .copied()
                .filter(|&other| other > word_id)
                .collect();
            candidates.sort_unstable();
            candidates.dedup();

            for other in candidates {
                let Some(other_vector) = vectors.get(&other) else {
                    continue;
                };
                let score = self.similarity.similarity(vector, other_vector);
                if score > self.min_similarity {
                    store.set_similarity(word_id, other, score)?;
                    stored += 1;
                }
            }
            batch.record()?;
        }
        let words = batch.finish()?;
        debug!("Compared {words} words");
        Ok(stored)
    }
}

/// Positive-PMI feature vectors of every word, keyed by word id. Words
/// whose features all have zero weight are left out.
fn feature_vectors<S: CorpusStore + ?Sized>(store: &S) -> Result<BTreeMap<WordId, FeatureVector>> {
    let rows = store.feature_rows()?;

    let mut total = 0;
    let mut word_totals: AHashMap<WordId, u64> = AHashMap::new();
    let mut feature_totals: AHashMap<&Feature, u64> = AHashMap::new();
    for row in &rows {
        total += row.frequency;
        *word_totals.entry(row.word_id).or_default() += row.frequency;
        *feature_totals.entry(&row.feature).or_default() += row.frequency;
    }

    let mut vectors: BTreeMap<WordId, FeatureVector> = BTreeMap::new();
    for row in &rows {
        let weight = scoring::positive_pmi(
            row.frequency,
            word_totals[&row.word_id],
            feature_totals[&row.feature],
            total,
        );
        if weight > 0.0 {
            vectors
                .entry(row.word_id)
                .or_default()
                .insert(row.feature.clone(), weight);
        }
    }
    Ok(vectors)
}
