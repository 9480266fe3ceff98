//! Recording collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;

use phalanx::config::PipelineConfig;
use phalanx::corpus::{
    BigramCount, DependencyCount, DependencyId, Document, DocumentCount, DocumentId, Sentence,
    SentenceId, Sequence, WordCount, WordId,
};
use phalanx::error::{PhalanxError, Result};
use phalanx::extract::{DocumentStructure, MetadataExtractor};
use phalanx::parse::{DocumentParser, ParseMode, SimpleParser};
use phalanx::pipeline::CollectionProcessor;
use phalanx::progress::{Checkpoint, CheckpointValue, ProgressLog, WriteMode};
use phalanx::storage::Storage;
use phalanx::storage::memory::{MemoryStorage, MemoryStorageConfig};
use phalanx::store::{
    BigramRow, CorpusDatabase, CorpusStore, FeatureRow, OccurrenceRow, TermFrequencyRow,
};

pub fn memory_storage() -> Arc<dyn Storage> {
    Arc::new(MemoryStorage::new(MemoryStorageConfig::default()))
}

/// A configuration with every stage after extraction turned off.
pub fn extraction_only_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.grammatical_processing = false;
    config.part_of_speech_tagging = false;
    config.sequence_indexing = false;
    config.statistics.word_counts = false;
    config.statistics.dependency_counts = false;
    config.statistics.document_counts = false;
    config.statistics.bigram_counts = false;
    config.statistics.tfidf = false;
    config.statistics.lin_similarity = false;
    config
}

/// A collection directory holding `files` (name, content) and a default
/// `structure.json` outside the collection.
pub struct Collection {
    pub root: TempDir,
}

impl Collection {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("collection")).unwrap();
        for (name, content) in files {
            fs::write(root.path().join("collection").join(name), content).unwrap();
        }
        fs::write(
            root.path().join("structure.json"),
            r#"{"title_field": "title", "text_field": "text", "metadata_fields": ["author"]}"#,
        )
        .unwrap();
        Collection { root }
    }

    pub fn dir(&self) -> PathBuf {
        self.root.path().join("collection")
    }

    pub fn structure(&self) -> PathBuf {
        self.root.path().join("structure.json")
    }
}

/// Store that delegates to a [`CorpusDatabase`] and records every call.
///
/// It can be told to fail `reset` or to fail indexing one sentence, in both
/// cases before the call reaches the database.
#[derive(Debug)]
pub struct RecordingStore {
    pub inner: CorpusDatabase,
    calls: Mutex<Vec<String>>,
    fail_reset: bool,
    fail_index_on: Option<SentenceId>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::open(memory_storage())
    }

    /// Open over `storage`, loading whatever was committed there.
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        RecordingStore {
            inner: CorpusDatabase::open(storage).unwrap(),
            calls: Mutex::new(Vec::new()),
            fail_reset: false,
            fail_index_on: None,
        }
    }

    pub fn failing_reset(mut self) -> Self {
        self.fail_reset = true;
        self
    }

    pub fn failing_index_on(mut self, sentence_id: SentenceId) -> Self {
        self.fail_index_on = Some(sentence_id);
        self
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.split(':').next() == Some(name))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }
}

impl CorpusStore for RecordingStore {
    fn create_new_document(&self, document: Document, file_sequence_number: u64) -> Result<DocumentId> {
        self.record(format!("create_new_document:{file_sequence_number}"));
        self.inner.create_new_document(document, file_sequence_number)
    }

    fn discard_partial_file(&self, file_sequence_number: u64) -> Result<usize> {
        self.record(format!("discard_partial_file:{file_sequence_number}"));
        self.inner.discard_partial_file(file_sequence_number)
    }

    fn record_extracted_file(&self, file_sequence_number: u64, file_name: &str) -> Result<()> {
        self.record(format!("record_extracted_file:{file_sequence_number}"));
        self.inner.record_extracted_file(file_sequence_number, file_name)
    }

    fn extracted_files(&self) -> Result<BTreeMap<u64, String>> {
        self.record("extracted_files");
        self.inner.extracted_files()
    }

    fn list_document_ids(&self) -> Result<Vec<DocumentId>> {
        self.record("list_document_ids");
        self.inner.list_document_ids()
    }

    fn get_document(&self, id: DocumentId) -> Result<Document> {
        self.record(format!("get_document:{id}"));
        self.inner.get_document(id)
    }

    fn save_document(&self, document: Document) -> Result<()> {
        self.record(format!("save_document:{}", document.id));
        self.inner.save_document(document)
    }

    fn finish_grammatical_processing(&self) -> Result<()> {
        self.record("finish_grammatical_processing");
        self.inner.finish_grammatical_processing()
    }

    fn list_unindexed_sentence_ids(&self) -> Result<Vec<SentenceId>> {
        self.record("list_unindexed_sentence_ids");
        self.inner.list_unindexed_sentence_ids()
    }

    fn get_sentence(&self, id: SentenceId) -> Result<Sentence> {
        self.record(format!("get_sentence:{id}"));
        self.inner.get_sentence(id)
    }

    fn index_sequences(&self, sentence_id: SentenceId, sequences: Vec<Sequence>) -> Result<()> {
        self.record(format!("index_sequences:{sentence_id}"));
        if self.fail_index_on == Some(sentence_id) {
            return Err(PhalanxError::storage(format!(
                "cannot index sentence {sentence_id}"
            )));
        }
        self.inner.index_sequences(sentence_id, sequences)
    }

    fn finish_indexing_sequences(&self) -> Result<()> {
        self.record("finish_indexing_sequences");
        self.inner.finish_indexing_sequences()
    }

    fn word_rows(&self) -> Result<Vec<OccurrenceRow>> {
        self.record("word_rows");
        self.inner.word_rows()
    }

    fn set_word_count(&self, id: WordId, count: WordCount) -> Result<()> {
        self.record(format!("set_word_count:{id}"));
        self.inner.set_word_count(id, count)
    }

    fn dependency_rows(&self) -> Result<Vec<OccurrenceRow>> {
        self.record("dependency_rows");
        self.inner.dependency_rows()
    }

    fn set_dependency_count(&self, id: DependencyId, count: DependencyCount) -> Result<()> {
        self.record(format!("set_dependency_count:{id}"));
        self.inner.set_dependency_count(id, count)
    }

    fn set_document_count(&self, id: DocumentId, count: DocumentCount) -> Result<()> {
        self.record(format!("set_document_count:{id}"));
        self.inner.set_document_count(id, count)
    }

    fn bigram_rows(&self) -> Result<Vec<BigramRow>> {
        self.record("bigram_rows");
        self.inner.bigram_rows()
    }

    fn set_bigram_count(&self, first: WordId, second: WordId, count: BigramCount) -> Result<()> {
        self.record(format!("set_bigram_count:{first}"));
        self.inner.set_bigram_count(first, second, count)
    }

    fn term_frequency_rows(&self) -> Result<Vec<TermFrequencyRow>> {
        self.record("term_frequency_rows");
        self.inner.term_frequency_rows()
    }

    fn set_tfidf(&self, word_id: WordId, document_id: DocumentId, score: f64) -> Result<()> {
        self.record(format!("set_tfidf:{word_id}"));
        self.inner.set_tfidf(word_id, document_id, score)
    }

    fn feature_rows(&self) -> Result<Vec<FeatureRow>> {
        self.record("feature_rows");
        self.inner.feature_rows()
    }

    fn set_similarity(&self, first: WordId, second: WordId, score: f64) -> Result<()> {
        self.record(format!("set_similarity:{first}"));
        self.inner.set_similarity(first, second, score)
    }

    fn commit(&self) -> Result<()> {
        self.record("commit");
        self.inner.commit()
    }

    fn reset(&self) -> Result<()> {
        self.record("reset");
        if self.fail_reset {
            return Err(PhalanxError::storage("cannot reset corpus"));
        }
        self.inner.reset()
    }
}

/// In-memory progress log that records every write.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    entries: Mutex<BTreeMap<Checkpoint, Vec<CheckpointValue>>>,
    writes: Mutex<Vec<(Checkpoint, CheckpointValue, WriteMode)>>,
    fail_clear: bool,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a checkpoint without recording the write.
    pub fn preset(self, checkpoint: Checkpoint, value: impl Into<CheckpointValue>) -> Self {
        self.entries.lock().insert(checkpoint, vec![value.into()]);
        self
    }

    pub fn failing_clear(mut self) -> Self {
        self.fail_clear = true;
        self
    }

    pub fn writes(&self) -> Vec<(Checkpoint, CheckpointValue, WriteMode)> {
        self.writes.lock().clone()
    }

    pub fn clear_writes(&self) {
        self.writes.lock().clear();
    }
}

impl ProgressLog for RecordingProgress {
    fn get(&self, checkpoint: Checkpoint) -> Result<Option<CheckpointValue>> {
        Ok(self
            .entries
            .lock()
            .get(&checkpoint)
            .and_then(|values| values.last().copied()))
    }

    fn log(&self, checkpoint: Checkpoint, value: CheckpointValue, mode: WriteMode) -> Result<()> {
        phalanx::progress::check_kind(checkpoint, &value)?;
        self.writes.lock().push((checkpoint, value, mode));
        let mut entries = self.entries.lock();
        let values = entries.entry(checkpoint).or_default();
        if mode == WriteMode::Replace {
            values.clear();
        }
        values.push(value);
        Ok(())
    }

    fn history(&self, checkpoint: Checkpoint) -> Result<Vec<CheckpointValue>> {
        Ok(self
            .entries
            .lock()
            .get(&checkpoint)
            .cloned()
            .unwrap_or_default())
    }

    fn clear(&self) -> Result<()> {
        if self.fail_clear {
            return Err(PhalanxError::checkpoint("cannot clear progress"));
        }
        self.entries.lock().clear();
        Ok(())
    }
}

/// Extractor that fabricates `per_file` documents for every file.
#[derive(Debug)]
pub struct StubExtractor {
    per_file: usize,
    fail_on: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl StubExtractor {
    pub fn new(per_file: usize) -> Self {
        StubExtractor {
            per_file,
            fail_on: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(self, file_name: &str) -> Self {
        *self.fail_on.lock() = Some(file_name.to_string());
        self
    }

    pub fn heal(&self) {
        *self.fail_on.lock() = None;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl MetadataExtractor for StubExtractor {
    fn extract(&self, _structure: &DocumentStructure, path: &Path) -> Result<Vec<Document>> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        self.calls.lock().push(name.clone());

        if self.fail_on.lock().as_deref() == Some(name.as_str()) {
            return Err(PhalanxError::extraction(format!("{name}: malformed")));
        }

        Ok((0..self.per_file)
            .map(|position| {
                Document::new(
                    name.clone(),
                    position as u64,
                    format!("The whale {position} swam far. It dove deep."),
                )
            })
            .collect())
    }
}

/// Parser that records the ids it is called with and can fail on one.
#[derive(Debug)]
pub struct RecordingParser {
    inner: SimpleParser,
    fail_on: Option<DocumentId>,
    parsed: Mutex<Vec<DocumentId>>,
}

impl RecordingParser {
    pub fn new() -> Self {
        RecordingParser {
            inner: SimpleParser::new(ParseMode::Full),
            fail_on: None,
            parsed: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, id: DocumentId) -> Self {
        self.fail_on = Some(id);
        self
    }

    pub fn parsed(&self) -> Vec<DocumentId> {
        self.parsed.lock().clone()
    }
}

impl DocumentParser for RecordingParser {
    fn parse_document(&self, document: &mut Document) -> Result<()> {
        if self.fail_on == Some(document.id) {
            return Err(PhalanxError::parse(format!("cannot parse {}", document.id)));
        }
        self.parsed.lock().push(document.id);
        self.inner.parse_document(document)
    }
}

pub fn processor(
    store: Arc<RecordingStore>,
    progress: Arc<RecordingProgress>,
    extractor: Arc<StubExtractor>,
    parser: Arc<RecordingParser>,
    config: PipelineConfig,
) -> CollectionProcessor {
    CollectionProcessor::new(store, progress, extractor, parser, config).unwrap()
}
