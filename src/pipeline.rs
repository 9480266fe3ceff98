//! The resumable processing pipeline.
//!
//! A collection goes through a fixed sequence of stages. Each stage is gated
//! by a configuration flag and by its completion checkpoint in the progress
//! log, so `process` can be called again after a crash and picks up where
//! the last durable checkpoint left off.

use std::fmt;

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::progress::Checkpoint;
use crate::stats::Statistic;

pub mod processor;

pub use processor::CollectionProcessor;

/// One stage of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ExtractMetadata,
    ParseDocuments,
    IndexSequences,
    WordCounts,
    DependencyCounts,
    DocumentCounts,
    BigramCounts,
    Tfidf,
    LinSimilarity,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::ExtractMetadata,
        Stage::ParseDocuments,
        Stage::IndexSequences,
        Stage::WordCounts,
        Stage::DependencyCounts,
        Stage::DocumentCounts,
        Stage::BigramCounts,
        Stage::Tfidf,
        Stage::LinSimilarity,
    ];

    /// The flag checkpoint written when the stage completes.
    pub fn checkpoint(&self) -> Checkpoint {
        match self {
            Stage::ExtractMetadata => Checkpoint::FinishedRecordingTextAndMetadata,
            Stage::ParseDocuments => Checkpoint::FinishedGrammaticalProcessing,
            Stage::IndexSequences => Checkpoint::FinishedSequenceProcessing,
            Stage::WordCounts => Checkpoint::WordCountsDone,
            Stage::DependencyCounts => Checkpoint::DependencyCountsDone,
            Stage::DocumentCounts => Checkpoint::DocumentCountsDone,
            Stage::BigramCounts => Checkpoint::BigramCountsDone,
            Stage::Tfidf => Checkpoint::TfidfDone,
            Stage::LinSimilarity => Checkpoint::WordSimilarityCalculationsDone,
        }
    }

    /// The checkpoint that must be `true` before the stage may run.
    pub fn prerequisite(&self) -> Option<Checkpoint> {
        match self {
            Stage::ExtractMetadata | Stage::ParseDocuments => None,
            Stage::IndexSequences => Some(Checkpoint::FinishedGrammaticalProcessing),
            _ => Some(Checkpoint::FinishedSequenceProcessing),
        }
    }

    /// The statistic computed by an aggregation stage.
    pub fn statistic(&self) -> Option<Statistic> {
        match self {
            Stage::WordCounts => Some(Statistic::WordCounts),
            Stage::DependencyCounts => Some(Statistic::DependencyCounts),
            Stage::DocumentCounts => Some(Statistic::DocumentCounts),
            Stage::BigramCounts => Some(Statistic::BigramCounts),
            Stage::Tfidf => Some(Statistic::Tfidf),
            Stage::LinSimilarity => Some(Statistic::LinSimilarity),
            _ => None,
        }
    }

    pub fn is_enabled(&self, config: &PipelineConfig) -> bool {
        match self {
            Stage::ExtractMetadata => true,
            Stage::ParseDocuments => config.parsing_enabled(),
            Stage::IndexSequences => config.sequence_indexing,
            _ => self
                .statistic()
                .is_some_and(|statistic| statistic.is_enabled(&config.statistics)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::ExtractMetadata => "metadata extraction",
            Stage::ParseDocuments => "grammatical processing",
            Stage::IndexSequences => "sequence indexing",
            _ => self.statistic().map_or("statistics", |s| s.name()),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a stage did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Its configuration flag is off.
    Disabled,
    /// Its completion checkpoint is already `true`.
    AlreadyDone,
    /// An earlier stage it depends on has not completed.
    PrerequisiteMissing,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Disabled => f.write_str("disabled"),
            SkipReason::AlreadyDone => f.write_str("already done"),
            SkipReason::PrerequisiteMissing => f.write_str("prerequisite missing"),
        }
    }
}

/// Outcome of one `process` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessReport {
    pub ran: Vec<Stage>,
    pub skipped: Vec<(Stage, SkipReason)>,
    pub files_extracted: usize,
    pub documents_extracted: usize,
    pub documents_parsed: usize,
    pub sentences_indexed: usize,

    /// Wall-clock time of the whole call.
    pub elapsed_ms: u64,
}

impl ProcessReport {
    pub fn did_run(&self, stage: Stage) -> bool {
        self.ran.contains(&stage)
    }

    pub fn skip_reason(&self, stage: Stage) -> Option<SkipReason> {
        self.skipped
            .iter()
            .find(|(skipped, _)| *skipped == stage)
            .map(|(_, reason)| *reason)
    }
}
