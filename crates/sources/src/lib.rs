//! ptree-sources: record collectors for ptree
//!
//! This crate reads the raw process records that ptree turns into trees:
//! CSV exports, JSON arrays or NDJSON event logs, and a live `/proc`
//! snapshot on Linux.

pub mod delimited;
pub mod error;
pub mod json;
pub mod snapshot;

pub use delimited::read_csv;
pub use error::{SourceError, SourceResult};
pub use json::read_json;
pub use snapshot::snapshot_processes;

use ptree_core::Record;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Supported input encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    /// JSON array or newline-delimited JSON
    Json,
}

impl InputFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(InputFormat::Csv),
            "json" | "ndjson" | "jsonl" => Some(InputFormat::Json),
            _ => None,
        }
    }
}

impl std::str::FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(InputFormat::Csv),
            "json" | "ndjson" | "jsonl" => Ok(InputFormat::Json),
            other => Err(format!("unknown input format '{}'", other)),
        }
    }
}

/// Read records from any reader
pub fn read_records<R: Read>(reader: R, format: InputFormat) -> SourceResult<Vec<Record>> {
    match format {
        InputFormat::Csv => read_csv(reader),
        InputFormat::Json => read_json(reader),
    }
}

/// Load records from a file, or from stdin when `path` is `-`
///
/// Without an explicit format the file extension decides; stdin defaults to
/// JSON.
pub fn load_records(path: &Path, format: Option<InputFormat>) -> SourceResult<Vec<Record>> {
    if path == Path::new("-") {
        let format = format.unwrap_or(InputFormat::Json);
        return read_records(io::stdin().lock(), format);
    }

    let format = format
        .or_else(|| InputFormat::from_path(path))
        .ok_or_else(|| SourceError::UnknownFormat(path.display().to_string()))?;
    let file = File::open(path).map_err(|e| SourceError::io(path, e))?;
    log::debug!("loading {:?} records from {}", format, path.display());
    read_records(BufReader::new(file), format)
}
