//! Aggregate counts owned by the entities they describe.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub document_count: u64,
    pub sentence_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyCount {
    pub document_count: u64,
    pub sentence_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCount {
    pub sentence_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigramCount {
    /// Number of distinct sentences containing the pair.
    pub sentence_count: u64,
    /// Total number of adjacent occurrences of the pair.
    pub frequency: u64,
}
