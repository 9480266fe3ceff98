//! Command implementations for Phalanx CLI.

use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::PipelineConfig;
use crate::corpus::Document;
use crate::error::{PhalanxError, Result};
use crate::extract::JsonlExtractor;
use crate::parse::{DocumentParser, ParseMode, SimpleParser};
use crate::pipeline::CollectionProcessor;
use crate::progress::wal::WalProgressLog;
use crate::progress::{Checkpoint, ProgressLog};
use crate::storage::file::FileStorageConfig;
use crate::storage::{Storage, StorageConfig, StorageFactory};
use crate::store::CorpusDatabase;

/// Execute a CLI command.
pub fn execute_command(args: PhalanxArgs) -> Result<()> {
    match &args.command {
        Command::Process(process_args) => process_collection(process_args.clone(), &args),
        Command::Status(status_args) => show_status(status_args.clone(), &args),
        Command::Sequences(sequences_args) => show_sequences(sequences_args.clone(), &args),
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path),
        None => Ok(PipelineConfig::default()),
    }
}

fn open_storage(data_dir: &Path) -> Result<Arc<dyn Storage>> {
    StorageFactory::create(StorageConfig::File(FileStorageConfig::new(data_dir)))
}

/// Run the pipeline over a collection directory.
fn process_collection(args: ProcessArgs, cli_args: &PhalanxArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let storage = open_storage(&args.data_dir)?;

    let store = Arc::new(CorpusDatabase::open(storage.clone())?);
    let progress = Arc::new(WalProgressLog::open(storage)?);
    let parser = Arc::new(SimpleParser::new(ParseMode::from_config(&config)));

    info!(
        "Processing {} into {}",
        args.collection_dir.display(),
        args.data_dir.display()
    );
    let processor = CollectionProcessor::new(
        store.clone(),
        progress,
        Arc::new(JsonlExtractor::new()),
        parser,
        config,
    )?;
    let report = processor.process(
        &args.collection_dir,
        &args.structure,
        &args.extension,
        args.reset,
    )?;

    output_result(
        "Processing finished",
        &ProcessResult {
            data_dir: args.data_dir.to_string_lossy().to_string(),
            report,
            corpus: store.summary(),
        },
        cli_args,
    )
}

/// Show every checkpoint and the corpus size.
fn show_status(args: StatusArgs, cli_args: &PhalanxArgs) -> Result<()> {
    if !args.data_dir.is_dir() {
        return Err(PhalanxError::not_found(format!(
            "data directory {}",
            args.data_dir.display()
        )));
    }
    let storage = open_storage(&args.data_dir)?;
    let progress = WalProgressLog::open(storage.clone())?;
    let store = CorpusDatabase::open(storage)?;

    let mut checkpoints = Vec::with_capacity(Checkpoint::ALL.len());
    for checkpoint in Checkpoint::ALL {
        let history = if args.history {
            progress
                .history(checkpoint)?
                .iter()
                .map(ToString::to_string)
                .collect()
        } else {
            Vec::new()
        };
        checkpoints.push(CheckpointStatus {
            name: checkpoint.key().to_string(),
            value: progress.get(checkpoint)?.map(|value| value.to_string()),
            history,
        });
    }

    output_result(
        "Pipeline status",
        &StatusResult {
            data_dir: args.data_dir.to_string_lossy().to_string(),
            checkpoints,
            corpus: store.summary(),
        },
        cli_args,
    )
}

/// Tag a text with the simple parser and print its sequences.
fn show_sequences(args: SequencesArgs, cli_args: &PhalanxArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let generator = config.sequence_generator()?;

    let mut document = Document::new("<input>", 0, args.text);
    SimpleParser::new(ParseMode::TagsOnly).parse_document(&mut document)?;

    let sentences = document
        .sentences
        .iter()
        .map(|sentence| SentenceSequences {
            text: sentence.text.clone(),
            sequences: generator
                .generate(sentence)
                .into_iter()
                .filter(|sequence| !args.lemmas || sequence.is_lemmatized)
                .map(|sequence| SequenceLine {
                    start: sequence.start_position,
                    sequence: sequence.sequence,
                    lemmatized: sequence.is_lemmatized,
                    has_function_words: sequence.has_function_words,
                    all_function_words: sequence.all_function_words,
                })
                .collect(),
        })
        .collect();

    output_result(
        "Generated sequences",
        &SequencesResult { sentences },
        cli_args,
    )
}
