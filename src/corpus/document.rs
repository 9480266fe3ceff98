//! Documents, sentences and tagged words.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::corpus::{DocumentId, SentenceId};

/// A single word annotated by the grammatical parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaggedWord {
    /// The surface form as it appears in the text.
    pub word: String,
    /// The dictionary base form.
    pub lemma: String,
    /// The part-of-speech tag.
    pub tag: String,
}

impl TaggedWord {
    pub fn new<W, L, T>(word: W, lemma: L, tag: T) -> Self
    where
        W: Into<String>,
        L: Into<String>,
        T: Into<String>,
    {
        TaggedWord {
            word: word.into(),
            lemma: lemma.into(),
            tag: tag.into(),
        }
    }
}

/// A grammatical relation between two words of the same sentence.
///
/// `governor` and `dependent` index into [`Sentence::tagged`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub relation: String,
    pub governor: usize,
    pub dependent: usize,
}

impl Dependency {
    pub fn new<R: Into<String>>(relation: R, governor: usize, dependent: usize) -> Self {
        Dependency {
            relation: relation.into(),
            governor,
            dependent,
        }
    }
}

/// A parsed sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// Assigned by the store when the owning document is saved.
    pub id: SentenceId,
    pub document_id: DocumentId,
    pub text: String,
    pub tagged: Vec<TaggedWord>,
    pub dependencies: Vec<Dependency>,
}

impl Sentence {
    /// Create a sentence that has not been assigned an id yet.
    pub fn new<S: Into<String>>(document_id: DocumentId, text: S, tagged: Vec<TaggedWord>) -> Self {
        Sentence {
            id: 0,
            document_id,
            text: text.into(),
            tagged,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn len(&self) -> usize {
        self.tagged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tagged.is_empty()
    }
}

/// A document of the corpus.
///
/// Created by a metadata extractor with only text and metadata, then filled
/// with sentences by a document parser.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Assigned by the store on creation.
    pub id: DocumentId,
    /// Name of the collection file the document was extracted from.
    pub source_file: String,
    /// 1-based number of that file in extraction order.
    pub file_sequence_number: u64,
    /// Position of the document inside its source file.
    pub position: u64,
    pub title: String,
    pub metadata: BTreeMap<String, String>,
    pub text: String,
    pub sentences: Vec<Sentence>,
}

impl Document {
    pub fn new<S: Into<String>>(source_file: S, position: u64, text: impl Into<String>) -> Self {
        Document {
            source_file: source_file.into(),
            position,
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_parsed(&self) -> bool {
        !self.sentences.is_empty()
    }
}
