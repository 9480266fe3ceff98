//! Metadata extraction.
//!
//! A [`MetadataExtractor`] turns one raw collection file into the ordered
//! documents it contains, guided by a [`DocumentStructure`] descriptor that
//! says where the title, body text and metadata of each record live.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::corpus::Document;
use crate::error::{PhalanxError, Result};

pub mod jsonl;

pub use jsonl::JsonlExtractor;

/// Describes where the parts of a document live inside a source record.
///
/// # Examples
///
/// ```
/// use phalanx::extract::DocumentStructure;
///
/// let structure: DocumentStructure = serde_json::from_str(
///     r#"{"text_field": "body", "metadata_fields": ["author"]}"#,
/// ).unwrap();
/// assert_eq!(structure.title_field, "title");
/// assert_eq!(structure.text_field, "body");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentStructure {
    /// Field holding the document title. Missing titles are left empty.
    pub title_field: String,
    /// Field holding the document text. Required in every record.
    pub text_field: String,
    /// Fields copied into the document metadata when present.
    pub metadata_fields: Vec<String>,
}

impl Default for DocumentStructure {
    fn default() -> Self {
        DocumentStructure {
            title_field: "title".to_string(),
            text_field: "text".to_string(),
            metadata_fields: Vec::new(),
        }
    }
}

impl DocumentStructure {
    /// Load a descriptor from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PhalanxError::extraction(format!(
                "Failed to read document structure {}: {e}",
                path.display()
            ))
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Extracts documents from raw collection files.
pub trait MetadataExtractor: Send + Sync + std::fmt::Debug {
    /// Extract every document of `path`, in file order.
    ///
    /// A malformed or unreadable file is an error; no partial result is
    /// returned.
    fn extract(&self, structure: &DocumentStructure, path: &Path) -> Result<Vec<Document>>;
}
