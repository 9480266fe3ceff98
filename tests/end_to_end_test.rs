//! Full pipeline runs against on-disk storage.

mod common;

use std::path::Path;
use std::sync::Arc;

use common::Collection;
use phalanx::config::PipelineConfig;
use phalanx::error::Result;
use phalanx::extract::JsonlExtractor;
use phalanx::parse::{ParseMode, SimpleParser};
use phalanx::pipeline::{CollectionProcessor, ProcessReport, SkipReason, Stage};
use phalanx::progress::wal::WalProgressLog;
use phalanx::progress::{Checkpoint, ProgressLog};
use phalanx::storage::Storage;
use phalanx::storage::file::{FileStorage, FileStorageConfig};
use phalanx::store::{CorpusDatabase, CorpusStore};
use tempfile::TempDir;

const LETTERS: &str = r#"{"title": "One", "text": "The white whale swam far. Sailors hunted the whale.", "author": "Ann"}
{"title": "Two", "text": "A ship sailed the sea.", "author": "Bo"}
"#;

const LOGS: &str = r#"{"title": "Three", "text": "The whale sank the ship.", "author": "Cy"}
"#;

fn open_storage(dir: &Path) -> Result<Arc<dyn Storage>> {
    Ok(Arc::new(FileStorage::new(dir, FileStorageConfig::new(dir))?))
}

/// Open a fresh store and progress log over `data_dir` and run the pipeline.
fn run(
    data_dir: &Path,
    collection: &Collection,
    config: PipelineConfig,
) -> Result<(ProcessReport, Arc<CorpusDatabase>, Arc<WalProgressLog>)> {
    let storage = open_storage(data_dir)?;
    let store = Arc::new(CorpusDatabase::open(storage.clone())?);
    let progress = Arc::new(WalProgressLog::open(storage)?);
    let parser = Arc::new(SimpleParser::new(ParseMode::from_config(&config)));

    let report = CollectionProcessor::new(
        store.clone(),
        progress.clone(),
        Arc::new(JsonlExtractor::new()),
        parser,
        config,
    )?
    .process(&collection.dir(), &collection.structure(), "jsonl", false)?;

    Ok((report, store, progress))
}

#[test]
fn test_full_run_completes_every_stage() -> Result<()> {
    let collection = Collection::new(&[("a.jsonl", LETTERS), ("b.jsonl", LOGS)]);
    let data = TempDir::new().unwrap();

    let (report, store, progress) = run(data.path(), &collection, PipelineConfig::default())?;

    assert_eq!(report.ran, Stage::ALL.to_vec());
    assert_eq!(report.files_extracted, 2);
    assert_eq!(report.documents_extracted, 3);
    assert_eq!(report.documents_parsed, 3);
    assert_eq!(report.sentences_indexed, 4);
    for stage in Stage::ALL {
        assert!(progress.is_done(stage.checkpoint())?, "{stage} not done");
    }
    assert_eq!(progress.watermark(Checkpoint::TextAndMetadataRecorded)?, Some(2));
    assert_eq!(progress.watermark(Checkpoint::LatestParsedDocumentId)?, Some(2));

    let summary = store.summary();
    assert_eq!(summary.documents, 3);
    assert_eq!(summary.sentences, 4);
    assert_eq!(summary.indexed_sentences, 4);
    assert!(summary.vocabulary > 0);
    assert!(summary.dependencies > 0);
    assert!(summary.sequences > 0);
    assert!(summary.tfidfs > 0);

    let whale = store.phrase_count("whale", false).unwrap();
    assert_eq!(whale.sentence_count, 3);
    assert_eq!(whale.document_count, 2);

    let first = store.get_document(0)?;
    assert_eq!(first.title, "One");
    assert_eq!(first.metadata.get("author").map(String::as_str), Some("Ann"));
    assert_eq!(first.file_sequence_number, 1);
    assert_eq!(store.get_document(2)?.file_sequence_number, 2);

    Ok(())
}

#[test]
fn test_second_run_over_same_data_dir_is_a_no_op() -> Result<()> {
    let collection = Collection::new(&[("a.jsonl", LETTERS), ("b.jsonl", LOGS)]);
    let data = TempDir::new().unwrap();

    let (_, first_store, _) = run(data.path(), &collection, PipelineConfig::default())?;
    let before = first_store.summary();
    drop(first_store);

    let (report, store, _) = run(data.path(), &collection, PipelineConfig::default())?;

    assert!(report.ran.is_empty());
    for stage in Stage::ALL {
        assert_eq!(report.skip_reason(stage), Some(SkipReason::AlreadyDone));
    }
    let after = store.summary();
    assert_eq!(after.documents, before.documents);
    assert_eq!(after.sequences, before.sequences);
    assert_eq!(after.tfidfs, before.tfidfs);

    Ok(())
}

#[test]
fn test_enabling_statistics_later_runs_only_those_stages() -> Result<()> {
    let collection = Collection::new(&[("a.jsonl", LETTERS), ("b.jsonl", LOGS)]);
    let data = TempDir::new().unwrap();

    let mut config = PipelineConfig::default();
    config.statistics.tfidf = false;
    config.statistics.lin_similarity = false;
    let (report, store, _) = run(data.path(), &collection, config)?;
    assert_eq!(
        report.skip_reason(Stage::Tfidf),
        Some(SkipReason::Disabled)
    );
    assert_eq!(store.summary().tfidfs, 0);
    drop(store);

    let (report, store, progress) = run(data.path(), &collection, PipelineConfig::default())?;

    assert_eq!(report.ran, vec![Stage::Tfidf, Stage::LinSimilarity]);
    assert_eq!(report.documents_extracted, 0);
    assert!(store.summary().tfidfs > 0);
    assert!(progress.is_done(Checkpoint::WordSimilarityCalculationsDone)?);

    Ok(())
}

#[test]
fn test_new_collection_file_is_not_picked_up_after_extraction_finished() -> Result<()> {
    let collection = Collection::new(&[("a.jsonl", LETTERS)]);
    let data = TempDir::new().unwrap();

    run(data.path(), &collection, PipelineConfig::default())?;
    std::fs::write(collection.dir().join("b.jsonl"), LOGS).unwrap();

    let (report, store, _) = run(data.path(), &collection, PipelineConfig::default())?;

    assert_eq!(
        report.skip_reason(Stage::ExtractMetadata),
        Some(SkipReason::AlreadyDone)
    );
    assert_eq!(store.list_document_ids()?, vec![0, 1]);

    Ok(())
}
