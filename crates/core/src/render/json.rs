//! JSON rendering for output records

use crate::output::OutputRecord;

/// Render records as a pretty-printed JSON array (or a single object)
pub fn render_json_string(records: &[OutputRecord]) -> serde_json::Result<String> {
    match records {
        [single] => serde_json::to_string_pretty(single),
        _ => serde_json::to_string_pretty(records),
    }
}

/// Render records as newline-delimited JSON, one compact object per line
pub fn render_json_lines(records: &[OutputRecord]) -> serde_json::Result<String> {
    let lines = records
        .iter()
        .map(serde_json::to_string)
        .collect::<serde_json::Result<Vec<_>>>()?;
    Ok(lines.join("\n"))
}
