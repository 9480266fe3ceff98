//! JSONL collection files.
//!
//! Each non-empty line of the file is one JSON object, for example:
//! ```jsonl
//! {"title": "Letter 1", "text": "Dear sir. I write to you.", "author": "Anon"}
//! {"title": "Letter 2", "text": "Another letter.", "year": 1851}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;

use crate::corpus::Document;
use crate::error::{PhalanxError, Result};
use crate::extract::{DocumentStructure, MetadataExtractor};

/// Extracts one document per line of a JSONL file.
#[derive(Debug, Clone, Default)]
pub struct JsonlExtractor;

impl JsonlExtractor {
    pub fn new() -> Self {
        JsonlExtractor
    }

    fn parse_line(
        &self,
        structure: &DocumentStructure,
        source_file: &str,
        position: u64,
        line: &str,
    ) -> Result<Document> {
        let value: Value = serde_json::from_str(line).map_err(|e| {
            PhalanxError::extraction(format!("{source_file}: record {position}: {e}"))
        })?;
        let object = value.as_object().ok_or_else(|| {
            PhalanxError::extraction(format!(
                "{source_file}: record {position}: expected a JSON object"
            ))
        })?;

        let text = object
            .get(&structure.text_field)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PhalanxError::extraction(format!(
                    "{source_file}: record {position}: missing text field '{}'",
                    structure.text_field
                ))
            })?;

        let mut document = Document::new(source_file, position, text);
        if let Some(title) = object.get(&structure.title_field) {
            document.title = value_to_string(title);
        }
        for field in &structure.metadata_fields {
            if let Some(value) = object.get(field) {
                document.metadata.insert(field.clone(), value_to_string(value));
            }
        }

        Ok(document)
    }
}

impl MetadataExtractor for JsonlExtractor {
    fn extract(&self, structure: &DocumentStructure, path: &Path) -> Result<Vec<Document>> {
        let source_file = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let file = File::open(path).map_err(|e| {
            PhalanxError::extraction(format!("Failed to open {}: {e}", path.display()))
        })?;

        let mut documents = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let position = documents.len() as u64;
            documents.push(self.parse_line(structure, &source_file, position, &line)?);
        }

        Ok(documents)
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
