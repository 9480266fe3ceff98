//! Sequence generation.
//!
//! A [`SequenceGenerator`] cuts a tagged sentence into every contiguous span
//! of one to `max_length` words and emits, per span, a surface-form and a
//! lemmatized sequence, plus function-word-stripped variants of both when
//! the span carries function words after its first word.
//!
//! Deduplication is scoped to a start index: the phrases already emitted
//! for start `i` are tracked in a [`SeenPhrases`] value that is created when
//! `i` is reached and dropped when the generator moves to `i + 1`.
//!
//! # Examples
//!
//! ```
//! use phalanx::analysis::{SequenceGenerator, StopWords};
//! use phalanx::corpus::{Sentence, TaggedWord};
//!
//! let generator = SequenceGenerator::new(StopWords::english());
//! let sentence = Sentence::new(
//!     0,
//!     "cat the mat",
//!     vec![
//!         TaggedWord::new("cat", "cat", "NN"),
//!         TaggedWord::new("the", "the", "DT"),
//!         TaggedWord::new("mat", "mat", "NN"),
//!     ],
//! );
//!
//! let sequences = generator.generate(&sentence);
//! assert!(sequences.iter().any(|s| s.sequence == "cat mat" && !s.is_lemmatized));
//! ```

use std::collections::HashSet;

use crate::analysis::stop_words::StopWords;
use crate::corpus::{Sentence, Sequence, TaggedWord};

/// Default maximum number of words in a sequence.
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 5;

/// Phrases already emitted for one start index.
///
/// Surface and lemmatized phrases are tracked separately.
#[derive(Debug, Default)]
pub struct SeenPhrases {
    surface: HashSet<String>,
    lemmatized: HashSet<String>,
}

impl SeenPhrases {
    fn set(&mut self, lemmatized: bool) -> &mut HashSet<String> {
        if lemmatized {
            &mut self.lemmatized
        } else {
            &mut self.surface
        }
    }

    fn contains(&self, phrase: &str, lemmatized: bool) -> bool {
        if lemmatized {
            self.lemmatized.contains(phrase)
        } else {
            self.surface.contains(phrase)
        }
    }
}

/// Cuts tagged sentences into indexable sequences.
#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    stop_words: StopWords,
    max_length: usize,
}

impl SequenceGenerator {
    /// Create a generator with the default maximum length of five words.
    pub fn new(stop_words: StopWords) -> Self {
        SequenceGenerator {
            stop_words,
            max_length: DEFAULT_MAX_SEQUENCE_LENGTH,
        }
    }

    /// Set the maximum number of words per sequence (at least one).
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length.max(1);
        self
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    /// Generate every sequence of `sentence`, in start-then-end order.
    pub fn generate(&self, sentence: &Sentence) -> Vec<Sequence> {
        let len = sentence.tagged.len();
        let mut sequences = Vec::new();

        for start in 0..len {
            let mut seen = SeenPhrases::default();
            let last_end = (start + self.max_length).min(len);
            for end in (start + 1)..=last_end {
                sequences.extend(self.span_sequences(sentence, start, end, &mut seen));
            }
        }

        sequences
    }

    /// Sequences of the span `sentence.tagged[start..end]`.
    ///
    /// Returns nothing when the surface phrase of the span has already been
    /// emitted for `start`.
    pub fn span_sequences(
        &self,
        sentence: &Sentence,
        start: usize,
        end: usize,
        seen: &mut SeenPhrases,
    ) -> Vec<Sequence> {
        let words = &sentence.tagged[start..end];
        let surface_phrase = join_words(words);
        if seen.contains(&surface_phrase, false) {
            return Vec::new();
        }
        let lemmatized_phrase = join_lemmas(words);

        let kept: Vec<usize> = (0..words.len())
            .filter(|&index| !self.stop_words.is_stop_word(&words[index].word))
            .collect();
        let has_function_words = kept.len() < words.len();
        let all_function_words = kept.is_empty();
        // Only trailing and interior function words may be stripped.
        let strippable = has_function_words && !all_function_words && kept[0] == 0;

        let stripped_words: Vec<TaggedWord> = if strippable {
            kept.iter().map(|&index| words[index].clone()).collect()
        } else {
            Vec::new()
        };

        let make = |sequence: String, lemmatized: bool, stripped: bool| Sequence {
            start_position: start,
            sentence_id: sentence.id,
            document_id: sentence.document_id,
            sequence,
            is_lemmatized: lemmatized,
            has_function_words: has_function_words && !stripped,
            all_function_words: all_function_words && !stripped,
            words: if stripped {
                stripped_words.clone()
            } else {
                words.to_vec()
            },
        };

        let mut sequences = Vec::with_capacity(4);

        for (lemmatized, phrase) in [(false, surface_phrase), (true, lemmatized_phrase)] {
            seen.set(lemmatized).insert(phrase.clone());
            sequences.push(make(phrase, lemmatized, false));

            if strippable {
                let stripped_phrase = if lemmatized {
                    join_lemmas(&stripped_words)
                } else {
                    join_words(&stripped_words)
                };
                if !seen.contains(&stripped_phrase, lemmatized) {
                    seen.set(lemmatized).insert(stripped_phrase.clone());
                    sequences.push(make(stripped_phrase, lemmatized, true));
                }
            }
        }

        sequences
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new(StopWords::english())
    }
}

fn join_words(words: &[TaggedWord]) -> String {
    words
        .iter()
        .map(|word| word.word.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_lemmas(words: &[TaggedWord]) -> String {
    words
        .iter()
        .map(|word| word.lemma.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
