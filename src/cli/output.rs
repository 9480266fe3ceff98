//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, PhalanxArgs};
use crate::error::Result;
use crate::pipeline::ProcessReport;
use crate::store::database::CorpusSummary;

/// Result structure for a pipeline run.
#[derive(Debug, Serialize)]
pub struct ProcessResult {
    pub data_dir: String,
    pub report: ProcessReport,
    pub corpus: CorpusSummary,
}

/// State of one checkpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckpointStatus {
    pub name: String,
    pub value: Option<String>,
    pub history: Vec<String>,
}

/// Result structure for the status command.
#[derive(Debug, Serialize)]
pub struct StatusResult {
    pub data_dir: String,
    pub checkpoints: Vec<CheckpointStatus>,
    pub corpus: CorpusSummary,
}

/// One generated sequence.
#[derive(Debug, Serialize, Deserialize)]
pub struct SequenceLine {
    pub start: usize,
    pub sequence: String,
    pub lemmatized: bool,
    pub has_function_words: bool,
    pub all_function_words: bool,
}

/// Sequences of one sentence.
#[derive(Debug, Serialize, Deserialize)]
pub struct SentenceSequences {
    pub text: String,
    pub sequences: Vec<SequenceLine>,
}

/// Result structure for the sequences command.
#[derive(Debug, Serialize, Deserialize)]
pub struct SequencesResult {
    pub sentences: Vec<SentenceSequences>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &PhalanxArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
        OutputFormat::Yaml => output_yaml(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &PhalanxArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    // Convert to JSON value for easier manipulation
    let value = serde_json::to_value(result)?;

    match result {
        _ if std::any::type_name::<T>().ends_with("StatusResult") => output_status_human(&value),
        _ if std::any::type_name::<T>().ends_with("SequencesResult") => {
            output_sequences_human(&value)
        }
        _ => output_generic_human(&value),
    }
}

/// Output checkpoint status in human format.
fn output_status_human(value: &serde_json::Value) -> Result<()> {
    if let Some(checkpoints) = value.get("checkpoints").and_then(|c| c.as_array()) {
        println!("Checkpoints:");
        println!("════════════");
        for checkpoint in checkpoints {
            let name = checkpoint.get("name").and_then(|n| n.as_str()).unwrap_or("?");
            let current = checkpoint
                .get("value")
                .and_then(|v| v.as_str())
                .unwrap_or("-");
            println!("{name:<36} {current}");

            if let Some(history) = checkpoint.get("history").and_then(|h| h.as_array())
                && history.len() > 1
            {
                let formatted = history.iter().map(format_value).collect::<Vec<_>>();
                println!("{:<36} history: {}", "", formatted.join(", "));
            }
        }
    }

    if let Some(corpus) = value.get("corpus") {
        println!();
        println!("Corpus:");
        println!("═══════");
        output_generic_human(corpus)?;
    }
    Ok(())
}

/// Output generated sequences in human format.
fn output_sequences_human(value: &serde_json::Value) -> Result<()> {
    let Some(sentences) = value.get("sentences").and_then(|s| s.as_array()) else {
        return Ok(());
    };

    for sentence in sentences {
        if let Some(text) = sentence.get("text").and_then(|t| t.as_str()) {
            println!("{text}");
            println!("─────────────");
        }
        for sequence in sentence
            .get("sequences")
            .and_then(|s| s.as_array())
            .into_iter()
            .flatten()
        {
            let flag = |name: &str| sequence.get(name).and_then(|v| v.as_bool()) == Some(true);
            let mut markers = String::new();
            if flag("lemmatized") {
                markers.push('L');
            }
            if flag("has_function_words") {
                markers.push('F');
            }
            if flag("all_function_words") {
                markers.push('A');
            }
            println!(
                "  {:>2} {:<3} {}",
                sequence.get("start").and_then(|s| s.as_u64()).unwrap_or(0),
                markers,
                sequence.get("sequence").and_then(|s| s.as_str()).unwrap_or("")
            );
        }
        println!();
    }
    Ok(())
}

/// Output generic result in human format.
fn output_generic_human(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                let formatted_val = format_value(val);
                println!("{key}: {formatted_val}");
            }
        }
        _ => {
            let formatted_value = format_value(value);
            println!("{formatted_value}");
        }
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &PhalanxArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Output in YAML format.
fn output_yaml<T: Serialize>(result: &T, _args: &PhalanxArgs) -> Result<()> {
    // Convert to JSON value first, then format as simple YAML
    let value = serde_json::to_value(result)?;
    print_yaml_value(&value, 0);
    Ok(())
}

/// Print YAML value with indentation.
fn print_yaml_value(value: &serde_json::Value, indent: usize) {
    let spaces = "  ".repeat(indent);

    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                match val {
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        println!("{spaces}{key}:");
                        print_yaml_value(val, indent + 1);
                    }
                    _ => println!("{spaces}{key}: {}", format_yaml_value(val)),
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr {
                match item {
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        println!("{spaces}-");
                        print_yaml_value(item, indent + 1);
                    }
                    _ => println!("{spaces}- {}", format_yaml_value(item)),
                }
            }
        }
        _ => println!("{spaces}{}", format_yaml_value(value)),
    }
}

/// Format a JSON value for YAML output.
fn format_yaml_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => {
            if s.is_empty() || s.contains(['\n', '"', '\\', ':', '#']) {
                let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
                format!("\"{escaped}\"")
            } else {
                s.clone()
            }
        }
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => "null".to_string(),
        _ => "~".to_string(), // For complex types
    }
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}
