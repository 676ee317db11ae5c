//! JSON I/O handling for CLI
//!
//! - Input: JSON files
//! - Output: one JSON value on stdout
//! - UTF-8 only

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read and decode a JSON file
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("{}: {}", path.display(), e)))?;

    serde_json::from_str(&content)
        .map_err(|e| CliError::invalid_input(format!("{}: {}", path.display(), e)))
}

/// Assigns an engine id to each document: its `id` field when it is a
/// string or number, otherwise its position in the file
pub fn keyed_documents(documents: Vec<Value>) -> CliResult<Vec<(String, Value)>> {
    documents
        .into_iter()
        .enumerate()
        .map(|(position, document)| {
            if !document.is_object() {
                return Err(CliError::invalid_input(format!(
                    "document {} is not a JSON object",
                    position
                )));
            }
            let id = match document.get("id") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => position.to_string(),
            };
            Ok((id, document))
        })
        .collect()
}

/// Write a JSON value to stdout
pub fn write_json(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
