//! Indexable word sequences.

use serde::{Deserialize, Serialize};

use crate::corpus::{DocumentId, SentenceId, TaggedWord};

/// A contiguous span of one to five words cut from a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    /// Index of the first word of the span in its sentence.
    pub start_position: usize,
    pub sentence_id: SentenceId,
    pub document_id: DocumentId,
    /// Surface words or lemmas joined by a single space.
    pub sequence: String,
    pub is_lemmatized: bool,
    /// The span contains at least one function word.
    pub has_function_words: bool,
    /// The span is made only of function words.
    pub all_function_words: bool,
    pub words: Vec<TaggedWord>,
}

impl Sequence {
    /// Number of words in the sequence.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
