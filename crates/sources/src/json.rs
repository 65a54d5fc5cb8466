//! JSON records: a top-level array or newline-delimited objects

use crate::error::{SourceError, SourceResult};
use ptree_core::Record;
use std::io::Read;

/// Read a JSON array of objects, or one object per line
pub fn read_json<R: Read>(mut reader: R) -> SourceResult<Vec<Record>> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| SourceError::io("<json input>", e))?;

    if text.trim_start().starts_with('[') {
        return serde_json::from_str(&text).map_err(|source| SourceError::Json {
            line: source.line(),
            source,
        });
    }
    parse_lines(&text)
}

fn parse_lines(text: &str) -> SourceResult<Vec<Record>> {
    let mut records = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(line).map_err(|source| SourceError::Json {
            line: i + 1,
            source,
        })?;
        records.push(record);
    }
    log::debug!("read {} JSON lines", records.len());
    Ok(records)
}
