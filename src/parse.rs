//! Grammatical parsing.
//!
//! A [`DocumentParser`] splits a document's text into sentences and attaches
//! tagged words (and, in full mode, dependency relations) to each of them.
//! Real deployments plug in an external tagger; [`simple::SimpleParser`] is a
//! rule-based stand-in that keeps the pipeline usable without one.

use crate::config::PipelineConfig;
use crate::corpus::Document;
use crate::error::Result;

pub mod simple;

pub use simple::SimpleParser;

/// How much grammatical information a parser attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Part-of-speech tags and lemmas only.
    TagsOnly,
    /// Tags, lemmas and dependency relations.
    #[default]
    Full,
}

impl ParseMode {
    /// Full parsing when grammatical processing is enabled, tags only when
    /// just part-of-speech tagging is.
    pub fn from_config(config: &PipelineConfig) -> Self {
        if config.grammatical_processing {
            ParseMode::Full
        } else {
            ParseMode::TagsOnly
        }
    }
}

/// Annotates documents in place.
pub trait DocumentParser: Send + Sync + std::fmt::Debug {
    /// Replace `document.sentences` with the parsed sentences of its text.
    ///
    /// May be slow; the pipeline calls it once per document and commits
    /// after each call.
    fn parse_document(&self, document: &mut Document) -> Result<()>;
}
