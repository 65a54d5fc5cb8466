//! CSV records (header row gives the field names)

use crate::error::SourceResult;
use ptree_core::{FieldValue, Record};
use std::io::Read;

/// Read every CSV row as a record of text values
///
/// Rows shorter than the header simply lack the missing fields.
pub fn read_csv<R: Read>(reader: R) -> SourceResult<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.to_string(), FieldValue::from(value)))
            .collect();
        records.push(record);
    }
    log::debug!("read {} CSV rows with {} columns", records.len(), headers.len());
    Ok(records)
}
