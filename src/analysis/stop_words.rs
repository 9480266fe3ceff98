//! Function-word (stop word) sets.
//!
//! A [`StopWords`] value is an immutable set of lowercased words shared
//! behind an `Arc`. The sequence generator receives one at construction, so
//! tests and other locales can swap in their own lists.
//!
//! # Examples
//!
//! ```
//! use phalanx::analysis::stop_words::StopWords;
//!
//! let stops = StopWords::english();
//! assert!(stops.is_stop_word("The"));
//! assert!(!stops.is_stop_word("cat"));
//!
//! let custom = StopWords::from_words(vec!["foo", "bar"]);
//! assert_eq!(custom.len(), 2);
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use crate::error::{PhalanxError, Result};

const PRONOUNS: &[&str] = &[
    "i", "its", "it", "you", "your", "thou", "thine", "thee", "we", "he", "they", "me", "us",
    "her", "them", "him", "my", "mine", "hers", "his", "our", "thy", "ours", "their", "theirs",
    "myself", "itself", "mimself", "ourselves", "herself", "themselves", "anything", "something",
    "everything", "nothing", "anyone", "someone", "everyone", "ones", "such",
];

const PREPOSITIONS: &[&str] = &[
    "about", "away", "across", "against", "along", "around", "at", "behind", "beside", "besides",
    "by", "despite", "down", "during", "for", "from", "in", "inside", "into", "near", "of", "off",
    "on", "onto", "over", "through", "to", "toward", "with", "within", "whence", "until",
    "without", "upon", "hither", "thither", "unto", "up",
];

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "some", "any", "this", "these", "each", "that", "no", "every", "all", "half",
    "both", "twice", "one", "two", "first", "second", "other", "another", "next", "last", "many",
    "few", "much", "little", "more", "less", "most", "least", "several", "own",
];

const CONJUNCTIONS: &[&str] = &[
    "and", "or", "but", "so", "when", "as", "while", "because", "although", "if", "though",
    "what", "who", "where", "whom", "why", "whose", "which", "how", "than", "nor", "not",
];

const MODAL_VERBS: &[&str] = &[
    "can", "can't", "don't", "won't", "shan't", "shouldn't", "ca", "canst", "might", "may",
    "would", "wouldst", "will", "willst", "should", "shall", "must", "could",
];

const PRIMARY_VERBS: &[&str] = &[
    "is", "are", "am", "be", "been", "being", "went", "go", "do", "did", "doth", "has", "have",
    "hath", "was", "were", "had",
];

const ADVERBS: &[&str] = &[
    "again", "very", "here", "there", "today", "tomorrow", "now", "then", "always", "never",
    "sometimes", "usually", "often", "therefore", "however", "moreover", "otherwise", "else",
    "instead", "anyway", "incidentally", "meanwhile",
];

const PUNCTUATION: &[&str] = &[
    ".", "!", "@", "#", "$", "%", "^", "&", "*", "(", ")", "_", "-", "--", "---", "+", "=", "`",
    "~", "{", "}", "[", "]", "|", "\\", ":", ";", "\"", "'", "<", ">", "?", ",", "/",
];

const CONTRACTIONS: &[&str] = &["'s", "'nt", "'m", "n't", "th", "'ll", "o", "s", "'t", "'rt"];

/// The default English function-word set.
pub static DEFAULT_ENGLISH_STOP_WORDS: LazyLock<StopWords> = LazyLock::new(|| {
    StopWords::from_words(
        [
            PRONOUNS,
            PREPOSITIONS,
            DETERMINERS,
            CONJUNCTIONS,
            MODAL_VERBS,
            PRIMARY_VERBS,
            ADVERBS,
            PUNCTUATION,
            CONTRACTIONS,
        ]
        .concat(),
    )
});

/// An immutable set of function words.
///
/// Lookups lowercase the candidate word, so entries are stored lowercased.
#[derive(Clone, Debug)]
pub struct StopWords {
    words: Arc<HashSet<String>>,
}

impl StopWords {
    /// The default English set (pronouns, prepositions, determiners,
    /// conjunctions, modal and primary verbs, adverbs, punctuation tokens and
    /// contraction fragments).
    pub fn english() -> Self {
        DEFAULT_ENGLISH_STOP_WORDS.clone()
    }

    /// Build a set from a list of words.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words = words
            .into_iter()
            .map(|s| s.into().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        StopWords {
            words: Arc::new(words),
        }
    }

    /// Load a newline-separated list. Blank lines and lines starting with
    /// `#` are ignored.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PhalanxError::config(format!(
                "Failed to read stop word list {}: {e}",
                path.display()
            ))
        })?;

        Ok(Self::from_words(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        ))
    }

    /// Check whether `word` is a function word, ignoring case.
    pub fn is_stop_word(&self, word: &str) -> bool {
        if self.words.contains(word) {
            return true;
        }
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::english()
    }
}
