//! Command line argument parsing for Phalanx CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Phalanx - A resumable corpus-processing pipeline
#[derive(Parser, Debug, Clone)]
#[command(name = "phalanx")]
#[command(about = "A resumable corpus-processing pipeline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Phalanx Contributors")]
#[command(long_about = None)]
pub struct PhalanxArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl PhalanxArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the pipeline over a collection
    Process(ProcessArgs),

    /// Show checkpoints and corpus size
    Status(StatusArgs),

    /// Print the sequences generated for a text
    Sequences(SequencesArgs),
}

/// Arguments for processing a collection
#[derive(Parser, Debug, Clone)]
pub struct ProcessArgs {
    /// Directory holding the collection files
    #[arg(value_name = "COLLECTION_DIR")]
    pub collection_dir: PathBuf,

    /// Document structure file (JSON)
    #[arg(short, long, value_name = "STRUCTURE_FILE")]
    pub structure: PathBuf,

    /// Extension of the collection files
    #[arg(short, long, default_value = "jsonl")]
    pub extension: String,

    /// Directory for the corpus database and progress log
    #[arg(short, long, value_name = "DATA_DIR", env = "PHALANX_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Pipeline configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Wipe the corpus and all checkpoints before processing
    #[arg(long)]
    pub reset: bool,
}

/// Arguments for showing pipeline status
#[derive(Parser, Debug, Clone)]
pub struct StatusArgs {
    /// Directory for the corpus database and progress log
    #[arg(short, long, value_name = "DATA_DIR", env = "PHALANX_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Include the full history of every checkpoint
    #[arg(long)]
    pub history: bool,
}

/// Arguments for previewing sequences
#[derive(Parser, Debug, Clone)]
pub struct SequencesArgs {
    /// Text to split, tag and cut into sequences
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Pipeline configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Only print lemmatized sequences
    #[arg(long)]
    pub lemmas: bool,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}
