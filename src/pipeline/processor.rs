//! Collection processor: drives the stages over one collection.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

use crate::analysis::SequenceGenerator;
use crate::config::PipelineConfig;
use crate::error::{PhalanxError, Result};
use crate::extract::{DocumentStructure, MetadataExtractor};
use crate::parse::DocumentParser;
use crate::pipeline::{ProcessReport, SkipReason, Stage};
use crate::progress::{Checkpoint, ProgressLog, WriteMode};
use crate::stats::StatisticsAggregator;
use crate::store::CorpusStore;

/// Runs the pipeline stages against a store and a progress log.
///
/// Holds no state between [`process`](Self::process) calls besides its
/// collaborators: every call re-reads the checkpoints.
#[derive(Debug)]
pub struct CollectionProcessor {
    store: Arc<dyn CorpusStore>,
    progress: Arc<dyn ProgressLog>,
    extractor: Arc<dyn MetadataExtractor>,
    parser: Arc<dyn DocumentParser>,
    config: PipelineConfig,
    generator: SequenceGenerator,
    aggregator: StatisticsAggregator,
}

impl CollectionProcessor {
    pub fn new(
        store: Arc<dyn CorpusStore>,
        progress: Arc<dyn ProgressLog>,
        extractor: Arc<dyn MetadataExtractor>,
        parser: Arc<dyn DocumentParser>,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let generator = config.sequence_generator()?;
        let aggregator = StatisticsAggregator::from_config(&config.statistics)?;

        Ok(CollectionProcessor {
            store,
            progress,
            extractor,
            parser,
            config,
            generator,
            aggregator,
        })
    }

    /// Replace the default statistics aggregator.
    pub fn with_aggregator(mut self, aggregator: StatisticsAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every enabled, unfinished stage over the collection.
    ///
    /// With `reset` all corpus state and checkpoints are wiped first.
    pub fn process(
        &self,
        collection_dir: &Path,
        structure_file: &Path,
        extension: &str,
        reset: bool,
    ) -> Result<ProcessReport> {
        let start = Instant::now();
        let mut report = ProcessReport::default();

        if reset {
            info!("Resetting corpus and progress");
            // Never leave completion checkpoints over an emptied corpus.
            self.progress.clear()?;
            self.store.reset()?;
        }

        for stage in Stage::ALL {
            if let Some(reason) = self.skip_reason(stage)? {
                match reason {
                    SkipReason::PrerequisiteMissing => {
                        warn!("Skipping {stage}: prerequisite stage has not completed")
                    }
                    _ => debug!("Skipping {stage}: {reason}"),
                }
                report.skipped.push((stage, reason));
                continue;
            }

            info!("Starting {stage}");
            match stage {
                Stage::ExtractMetadata => {
                    self.extract_metadata(collection_dir, structure_file, extension, &mut report)?
                }
                Stage::ParseDocuments => self.parse_documents(&mut report)?,
                Stage::IndexSequences => self.index_sequences(&mut report)?,
                _ => self.aggregate(stage)?,
            }
            info!("Finished {stage}");
            report.ran.push(stage);
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    fn skip_reason(&self, stage: Stage) -> Result<Option<SkipReason>> {
        if !stage.is_enabled(&self.config) {
            return Ok(Some(SkipReason::Disabled));
        }
        if self.progress.is_done(stage.checkpoint())? {
            return Ok(Some(SkipReason::AlreadyDone));
        }
        if let Some(prerequisite) = stage.prerequisite() {
            if !self.progress.is_done(prerequisite)? {
                return Ok(Some(SkipReason::PrerequisiteMissing));
            }
        }
        Ok(None)
    }

    fn extract_metadata(
        &self,
        collection_dir: &Path,
        structure_file: &Path,
        extension: &str,
        report: &mut ProcessReport,
    ) -> Result<()> {
        let structure = DocumentStructure::from_file(structure_file)?;
        let files = collection_files(collection_dir, extension)?;
        let recorded = self
            .progress
            .watermark(Checkpoint::TextAndMetadataRecorded)?
            .unwrap_or(0);

        // Files are matched by name, so adding or removing files between an
        // interrupted run and its resume neither skips nor repeats a file.
        let extracted: BTreeSet<String> = self
            .store
            .extracted_files()?
            .into_iter()
            .filter(|(number, _)| *number <= recorded)
            .map(|(_, name)| name)
            .collect();
        if recorded > 0 {
            info!("Resuming extraction after {recorded} recorded files");
        }

        let mut file_number = recorded;
        for path in &files {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if extracted.contains(&file_name) {
                continue;
            }
            file_number += 1;

            let discarded = self.store.discard_partial_file(file_number)?;
            if discarded > 0 {
                warn!(
                    "Discarded {discarded} partial documents of {}",
                    path.display()
                );
            }

            let documents = self.extractor.extract(&structure, path)?;
            let count = documents.len();
            for document in documents {
                self.store.create_new_document(document, file_number)?;
            }
            self.store.record_extracted_file(file_number, &file_name)?;
            self.store.commit()?;
            self.progress
                .mark(Checkpoint::FinishedRecordingTextAndMetadata, false)?;
            self.progress.log(
                Checkpoint::TextAndMetadataRecorded,
                file_number.into(),
                WriteMode::Update,
            )?;

            debug!("Recorded {count} documents from {}", path.display());
            report.files_extracted += 1;
            report.documents_extracted += count;
        }

        self.progress
            .mark(Checkpoint::FinishedRecordingTextAndMetadata, true)
    }

    fn parse_documents(&self, report: &mut ProcessReport) -> Result<()> {
        let latest = self
            .progress
            .watermark(Checkpoint::LatestParsedDocumentId)?;
        if let Some(latest) = latest {
            info!("Resuming grammatical processing after document {latest}");
        }

        for id in self.store.list_document_ids()? {
            if latest.is_some_and(|latest| id <= latest) {
                continue;
            }

            let mut document = self.store.get_document(id)?;
            self.parser.parse_document(&mut document)?;
            let sentences = document.sentences.len();
            self.store.save_document(document)?;
            self.store.commit()?;
            self.progress
                .mark(Checkpoint::FinishedGrammaticalProcessing, false)?;
            self.progress.log(
                Checkpoint::LatestParsedDocumentId,
                id.into(),
                WriteMode::Replace,
            )?;

            debug!("Parsed document {id}: {sentences} sentences");
            report.documents_parsed += 1;
        }

        self.store.finish_grammatical_processing()?;
        self.store.commit()?;
        self.progress
            .mark(Checkpoint::FinishedGrammaticalProcessing, true)
    }

    fn index_sequences(&self, report: &mut ProcessReport) -> Result<()> {
        let interval = self.config.statistics.commit_interval;
        let sentence_ids = self.store.list_unindexed_sentence_ids()?;
        info!("Indexing sequences of {} sentences", sentence_ids.len());

        for (index, id) in sentence_ids.iter().enumerate() {
            let sentence = self.store.get_sentence(*id)?;
            let sequences = self.generator.generate(&sentence);
            self.store.index_sequences(*id, sequences)?;

            if (index + 1) % interval == 0 {
                self.store.commit()?;
                debug!("Indexed {} sentences", index + 1);
            }
            report.sentences_indexed += 1;
        }

        self.store.finish_indexing_sequences()?;
        self.store.commit()?;
        self.progress
            .mark(Checkpoint::FinishedSequenceProcessing, true)
    }

    fn aggregate(&self, stage: Stage) -> Result<()> {
        let statistic = stage
            .statistic()
            .ok_or_else(|| PhalanxError::other(format!("{stage} is not a statistics stage")))?;
        self.aggregator.run(statistic, self.store.as_ref())?;
        self.progress.mark(stage.checkpoint(), true)
    }
}

/// Collection files with extension `extension`, sorted by name.
///
/// The extension match ignores case and an optional leading dot. Hidden
/// files and directories are skipped.
pub fn collection_files(collection_dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let wanted = extension.trim_start_matches('.');
    let entries = std::fs::read_dir(collection_dir).map_err(|e| {
        PhalanxError::extraction(format!(
            "Failed to read collection {}: {e}",
            collection_dir.display()
        ))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_none_or(|name| name.starts_with('.'));
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted));
        if !hidden && matches {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
