//! CSV output for aggregated records
//!
//! Columns come from the records themselves: the first record's fields in
//! order, then any field first seen in a later record.

use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::birdeye::Record;

/// Output file could not be written; the run continues with the next request
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// `<output_dir>/<name>.csv`
pub fn csv_path(output_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    output_dir.as_ref().join(format!("{}.csv", name))
}

/// Header row for a record list
pub fn columns(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for record in records {
        for key in record.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Render one cell; strings raw, null empty, everything else as JSON text
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Save records to a CSV file, creating parent directories
///
/// Writes nothing and returns `Ok(0)` for an empty list.
pub fn write_csv(records: &[Record], path: impl AsRef<Path>) -> Result<usize, PersistError> {
    let path = path.as_ref();
    if records.is_empty() {
        return Ok(0);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PersistError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let csv_err = |source| PersistError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    let header = columns(records);
    writer.write_record(&header).map_err(csv_err)?;

    for record in records {
        writer
            .write_record(header.iter().map(|column| cell(record.get(column))))
            .map_err(csv_err)?;
    }

    writer.flush().map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Saved {} rows to {}", records.len(), path.display());
    Ok(records.len())
}
