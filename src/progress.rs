//! Persisted pipeline progress.
//!
//! The pipeline records two kinds of checkpoints: completion flags
//! ("finished_X") and numeric markers (the last parsed document id, the
//! number of collection files recorded). A [`Checkpoint`] names one of them
//! and fixes which kind of [`CheckpointValue`] it accepts, so a flag can
//! never be written where a watermark is expected.
//!
//! Writes come in two flavours ([`WriteMode`]): `Replace` discards the
//! checkpoint's history and keeps only the new value, `Update` appends the
//! value as the newest entry. Reads always return the newest entry.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use phalanx::progress::{Checkpoint, ProgressLog, WriteMode};
//! use phalanx::progress::wal::WalProgressLog;
//! use phalanx::storage::memory::MemoryStorage;
//!
//! # fn main() -> phalanx::error::Result<()> {
//! let log = WalProgressLog::open(Arc::new(MemoryStorage::default()))?;
//! assert!(!log.is_done(Checkpoint::FinishedGrammaticalProcessing)?);
//!
//! log.mark(Checkpoint::FinishedGrammaticalProcessing, true)?;
//! assert!(log.is_done(Checkpoint::FinishedGrammaticalProcessing)?);
//!
//! log.log(Checkpoint::LatestParsedDocumentId, 12u64.into(), WriteMode::Replace)?;
//! assert_eq!(log.watermark(Checkpoint::LatestParsedDocumentId)?, Some(12));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PhalanxError, Result};

pub mod wal;

/// The kind of value a checkpoint holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKind {
    Flag,
    Number,
}

/// Every checkpoint the pipeline records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Checkpoint {
    FinishedRecordingTextAndMetadata,
    TextAndMetadataRecorded,
    FinishedGrammaticalProcessing,
    LatestParsedDocumentId,
    FinishedSequenceProcessing,
    WordCountsDone,
    DependencyCountsDone,
    DocumentCountsDone,
    BigramCountsDone,
    TfidfDone,
    WordSimilarityCalculationsDone,
}

impl Checkpoint {
    pub const ALL: [Checkpoint; 11] = [
        Checkpoint::FinishedRecordingTextAndMetadata,
        Checkpoint::TextAndMetadataRecorded,
        Checkpoint::FinishedGrammaticalProcessing,
        Checkpoint::LatestParsedDocumentId,
        Checkpoint::FinishedSequenceProcessing,
        Checkpoint::WordCountsDone,
        Checkpoint::DependencyCountsDone,
        Checkpoint::DocumentCountsDone,
        Checkpoint::BigramCountsDone,
        Checkpoint::TfidfDone,
        Checkpoint::WordSimilarityCalculationsDone,
    ];

    /// The persisted key of this checkpoint.
    pub fn key(&self) -> &'static str {
        match self {
            Checkpoint::FinishedRecordingTextAndMetadata => "finished_recording_text_and_metadata",
            Checkpoint::TextAndMetadataRecorded => "text_and_metadata_recorded",
            Checkpoint::FinishedGrammaticalProcessing => "finished_grammatical_processing",
            Checkpoint::LatestParsedDocumentId => "latest_parsed_document_id",
            Checkpoint::FinishedSequenceProcessing => "finished_sequence_processing",
            Checkpoint::WordCountsDone => "word_counts_done",
            Checkpoint::DependencyCountsDone => "dependency_counts_done",
            Checkpoint::DocumentCountsDone => "document_counts_done",
            Checkpoint::BigramCountsDone => "bigram_counts_done",
            Checkpoint::TfidfDone => "tfidf_done",
            Checkpoint::WordSimilarityCalculationsDone => "word_similarity_calculations_done",
        }
    }

    pub fn kind(&self) -> CheckpointKind {
        match self {
            Checkpoint::TextAndMetadataRecorded | Checkpoint::LatestParsedDocumentId => {
                CheckpointKind::Number
            }
            _ => CheckpointKind::Flag,
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Checkpoint {
    type Err = PhalanxError;

    fn from_str(s: &str) -> Result<Self> {
        Checkpoint::ALL
            .into_iter()
            .find(|checkpoint| checkpoint.key() == s)
            .ok_or_else(|| PhalanxError::checkpoint(format!("Unknown checkpoint: {s}")))
    }
}

/// The value stored under a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointValue {
    Flag(bool),
    Number(u64),
}

impl CheckpointValue {
    pub fn kind(&self) -> CheckpointKind {
        match self {
            CheckpointValue::Flag(_) => CheckpointKind::Flag,
            CheckpointValue::Number(_) => CheckpointKind::Number,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            CheckpointValue::Flag(flag) => Some(*flag),
            CheckpointValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<u64> {
        match self {
            CheckpointValue::Number(number) => Some(*number),
            CheckpointValue::Flag(_) => None,
        }
    }
}

impl From<bool> for CheckpointValue {
    fn from(flag: bool) -> Self {
        CheckpointValue::Flag(flag)
    }
}

impl From<u64> for CheckpointValue {
    fn from(number: u64) -> Self {
        CheckpointValue::Number(number)
    }
}

impl fmt::Display for CheckpointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointValue::Flag(flag) => write!(f, "{flag}"),
            CheckpointValue::Number(number) => write!(f, "{number}"),
        }
    }
}

/// How a write combines with the checkpoint's existing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
    /// Overwrite: the new value becomes the only entry.
    Replace,
    /// Append the new value as the latest entry.
    Update,
}

/// A persisted store of pipeline checkpoints.
pub trait ProgressLog: Send + Sync + fmt::Debug {
    /// The latest value of `checkpoint`, if it was ever written.
    fn get(&self, checkpoint: Checkpoint) -> Result<Option<CheckpointValue>>;

    /// Persist `value` under `checkpoint`.
    ///
    /// The write is durable when this returns. Fails if the value kind does
    /// not match [`Checkpoint::kind`].
    fn log(&self, checkpoint: Checkpoint, value: CheckpointValue, mode: WriteMode) -> Result<()>;

    /// Every retained entry of `checkpoint`, oldest first.
    fn history(&self, checkpoint: Checkpoint) -> Result<Vec<CheckpointValue>>;

    /// Remove every checkpoint.
    fn clear(&self) -> Result<()>;

    /// True iff the flag `checkpoint` reads `true`.
    fn is_done(&self, checkpoint: Checkpoint) -> Result<bool> {
        Ok(self
            .get(checkpoint)?
            .and_then(|value| value.as_flag())
            .unwrap_or(false))
    }

    /// Write the flag `checkpoint` with replace semantics.
    fn mark(&self, checkpoint: Checkpoint, done: bool) -> Result<()> {
        self.log(checkpoint, CheckpointValue::Flag(done), WriteMode::Replace)
    }

    /// The numeric value of `checkpoint`, if one was written.
    fn watermark(&self, checkpoint: Checkpoint) -> Result<Option<u64>> {
        Ok(self.get(checkpoint)?.and_then(|value| value.as_number()))
    }
}

/// Reject values whose kind does not match the checkpoint.
pub fn check_kind(checkpoint: Checkpoint, value: &CheckpointValue) -> Result<()> {
    if checkpoint.kind() != value.kind() {
        return Err(PhalanxError::checkpoint(format!(
            "{checkpoint} expects a {:?} value, got {value}",
            checkpoint.kind()
        )));
    }
    Ok(())
}
