//! Rule-based sentence splitter and tagger.
//!
//! Sentences end at `.`, `!` or `?`. Words come from Unicode word
//! boundaries; punctuation marks are kept as their own tokens. Lemmas are
//! the case-folded surface form and tags are coarse token classes
//! (`WORD`, `NUM`, `PUNCT`). In full mode consecutive word tokens are linked
//! by an `adjacent` relation.

use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::corpus::{Dependency, Document, Sentence, TaggedWord};
use crate::error::{PhalanxError, Result};
use crate::parse::{DocumentParser, ParseMode};

static SENTENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+(?:[.!?]+|$)").expect("valid sentence pattern"));

pub const TAG_WORD: &str = "WORD";
pub const TAG_NUMBER: &str = "NUM";
pub const TAG_PUNCTUATION: &str = "PUNCT";
pub const ADJACENT_RELATION: &str = "adjacent";

#[derive(Debug, Clone, Default)]
pub struct SimpleParser {
    mode: ParseMode,
}

impl SimpleParser {
    pub fn new(mode: ParseMode) -> Self {
        SimpleParser { mode }
    }

    /// Split `text` into sentence strings.
    pub fn split_sentences(text: &str) -> Vec<&str> {
        SENTENCE_PATTERN
            .find_iter(text)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Tokenize and tag one sentence.
    pub fn tag(sentence: &str) -> Vec<TaggedWord> {
        sentence
            .split_word_bounds()
            .filter(|token| !token.trim().is_empty())
            .map(|token| TaggedWord::new(token, token.to_lowercase(), Self::detect_tag(token)))
            .collect()
    }

    fn detect_tag(token: &str) -> &'static str {
        if token.chars().all(|c| c.is_numeric()) {
            TAG_NUMBER
        } else if token.chars().any(|c| c.is_alphanumeric()) {
            TAG_WORD
        } else {
            TAG_PUNCTUATION
        }
    }

    fn adjacency(tagged: &[TaggedWord]) -> Vec<Dependency> {
        let words: Vec<usize> = (0..tagged.len())
            .filter(|&index| tagged[index].tag != TAG_PUNCTUATION)
            .collect();
        words
            .windows(2)
            .map(|pair| Dependency::new(ADJACENT_RELATION, pair[0], pair[1]))
            .collect()
    }
}

impl DocumentParser for SimpleParser {
    fn parse_document(&self, document: &mut Document) -> Result<()> {
        if document.text.contains('\0') {
            return Err(PhalanxError::parse(format!(
                "Document {} contains NUL bytes",
                document.id
            )));
        }

        document.sentences = Self::split_sentences(&document.text)
            .into_iter()
            .map(|text| {
                let tagged = Self::tag(text);
                let dependencies = match self.mode {
                    ParseMode::Full => Self::adjacency(&tagged),
                    ParseMode::TagsOnly => Vec::new(),
                };
                Sentence::new(document.id, text, tagged).with_dependencies(dependencies)
            })
            .collect();

        Ok(())
    }
}
