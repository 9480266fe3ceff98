//! Pipeline configuration.
//!
//! Every stage of the pipeline is gated by a flag here, in addition to its
//! completion checkpoint. The configuration is plain `serde` data so it can
//! be kept in a JSON file next to the collection.
//!
//! # Examples
//!
//! ```
//! use phalanx::config::PipelineConfig;
//!
//! let config: PipelineConfig = serde_json::from_str(
//!     r#"{"sequence_indexing": false, "statistics": {"commit_interval": 100}}"#,
//! ).unwrap();
//! assert!(!config.sequence_indexing);
//! assert!(config.grammatical_processing);
//! assert_eq!(config.statistics.commit_interval, 100);
//! assert!(config.validate().is_ok());
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::sequence::DEFAULT_MAX_SEQUENCE_LENGTH;
use crate::analysis::{SequenceGenerator, StopWords};
use crate::error::{PhalanxError, Result};

/// Configuration of the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run the sequence indexing stage.
    pub sequence_indexing: bool,

    /// Run the parse stage with part-of-speech tags only.
    pub part_of_speech_tagging: bool,

    /// Run the parse stage with full grammatical processing.
    pub grammatical_processing: bool,

    /// Sequence generation settings.
    pub sequences: SequenceConfig,

    /// Statistics settings.
    pub statistics: StatisticsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            sequence_indexing: true,
            part_of_speech_tagging: true,
            grammatical_processing: true,
            sequences: SequenceConfig::default(),
            statistics: StatisticsConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PhalanxError::config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .map_err(|e| PhalanxError::config(format!("Invalid config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Whether the parse stage runs at all.
    pub fn parsing_enabled(&self) -> bool {
        self.grammatical_processing || self.part_of_speech_tagging
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.statistics.commit_interval == 0 {
            return Err(PhalanxError::config("commit_interval must be at least 1"));
        }
        if self.sequences.max_length == 0 {
            return Err(PhalanxError::config("sequences.max_length must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.statistics.min_similarity) {
            return Err(PhalanxError::config(
                "statistics.min_similarity must be between 0 and 1",
            ));
        }
        Ok(())
    }

    /// Build the sequence generator described by this configuration.
    pub fn sequence_generator(&self) -> Result<SequenceGenerator> {
        let stop_words = match &self.sequences.stop_words_file {
            Some(path) => StopWords::from_file(path)?,
            None => StopWords::english(),
        };
        Ok(SequenceGenerator::new(stop_words).with_max_length(self.sequences.max_length))
    }
}

/// Sequence generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Maximum number of words per sequence.
    pub max_length: usize,

    /// Newline-separated function-word list replacing the English default.
    pub stop_words_file: Option<PathBuf>,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        SequenceConfig {
            max_length: DEFAULT_MAX_SEQUENCE_LENGTH,
            stop_words_file: None,
        }
    }
}

/// Statistics settings; one flag per aggregation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    pub word_counts: bool,
    pub dependency_counts: bool,
    pub document_counts: bool,
    pub bigram_counts: bool,
    pub tfidf: bool,
    pub lin_similarity: bool,

    /// Number of processed entities between two commits.
    pub commit_interval: usize,

    /// Similarity scores at or below this value are not stored.
    pub min_similarity: f64,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        StatisticsConfig {
            word_counts: true,
            dependency_counts: true,
            document_counts: true,
            bigram_counts: true,
            tfidf: true,
            lin_similarity: true,
            commit_interval: 500,
            min_similarity: 0.0,
        }
    }
}
