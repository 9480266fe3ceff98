//! Scoring functions used by the statistics aggregator.

use std::fmt::Debug;

use ahash::AHashMap;

use crate::store::Feature;

/// Positive-PMI weights of the grammatical contexts of one word.
pub type FeatureVector = AHashMap<Feature, f64>;

/// Weight of a term in a document.
pub trait TermWeighting: Send + Sync + Debug {
    fn weight(&self, term_frequency: u64, document_frequency: u64, document_total: u64) -> f64;
}

/// `tf * ln(N / df)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdf;

impl TermWeighting for TfIdf {
    fn weight(&self, term_frequency: u64, document_frequency: u64, document_total: u64) -> f64 {
        if document_frequency == 0 || document_total == 0 {
            return 0.0;
        }
        let idf = (document_total as f64 / document_frequency as f64).ln();
        term_frequency as f64 * idf
    }
}

/// Similarity of two feature vectors, in `[0, 1]`.
pub trait SimilarityMeasure: Send + Sync + Debug {
    fn similarity(&self, a: &FeatureVector, b: &FeatureVector) -> f64;
}

/// Lin's information-theoretic similarity.
///
/// The weight of the shared features over the weight of all features of
/// both words.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinSimilarity;

impl SimilarityMeasure for LinSimilarity {
    fn similarity(&self, a: &FeatureVector, b: &FeatureVector) -> f64 {
        let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        let shared: f64 = small
            .iter()
            .filter_map(|(feature, weight)| large.get(feature).map(|other| weight + other))
            .sum();
        let total: f64 = a.values().sum::<f64>() + b.values().sum::<f64>();

        if total <= 0.0 { 0.0 } else { shared / total }
    }
}

/// Positive pointwise mutual information of a word and a feature.
///
/// `ln(f(w,c) * N / (f(w) * f(c)))`, clamped at zero.
pub fn positive_pmi(joint: u64, word_total: u64, feature_total: u64, total: u64) -> f64 {
    if joint == 0 || word_total == 0 || feature_total == 0 {
        return 0.0;
    }
    let pmi = ((joint as f64 * total as f64) / (word_total as f64 * feature_total as f64)).ln();
    pmi.max(0.0)
}
