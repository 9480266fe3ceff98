//! Error types for the Phalanx library.
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! is the [`PhalanxError`] enum. Collaborators (extractors, parsers, stores)
//! report their failures through the same enum so that the pipeline can
//! propagate them with `?` and leave its checkpoints untouched.
//!
//! # Examples
//!
//! ```
//! use phalanx::error::{PhalanxError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(PhalanxError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Phalanx operations.
#[derive(Error, Debug)]
pub enum PhalanxError {
    /// I/O errors (file operations, directory listing, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metadata extraction errors (malformed or unreadable source files)
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Grammatical parsing errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Progress log errors (wrong value kind, corrupt records)
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Statistics aggregation errors
    #[error("Statistics error: {0}")]
    Statistics(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with PhalanxError.
pub type Result<T> = std::result::Result<T, PhalanxError>;

impl PhalanxError {
    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Storage(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Config(msg.into())
    }

    /// Create a new extraction error.
    pub fn extraction<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Extraction(msg.into())
    }

    /// Create a new parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Parse(msg.into())
    }

    /// Create a new checkpoint error.
    pub fn checkpoint<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Checkpoint(msg.into())
    }

    /// Create a new statistics error.
    pub fn statistics<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Statistics(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        PhalanxError::SerializationError(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Other(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Other(format!("Not found: {}", msg.into()))
    }
}
