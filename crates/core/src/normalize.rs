//! Coercion of raw field values into text and sortable times

use crate::models::{FieldValue, ParsedTime};
use crate::strptime::StrptimePattern;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Convert any field value to trimmed text; absent values become empty
pub fn normalize(value: Option<&FieldValue>) -> String {
    match value {
        None | Some(FieldValue::Null) => String::new(),
        Some(FieldValue::Text(s)) => s.trim().to_string(),
        Some(FieldValue::Integer(n)) => n.to_string(),
        Some(FieldValue::Float(f)) => f.to_string(),
        Some(FieldValue::Bool(b)) => b.to_string(),
        Some(FieldValue::DateTime(dt)) => display_datetime(dt),
        Some(FieldValue::Other(v)) => v.to_string().trim().to_string(),
    }
}

/// Parses creation times for one run
///
/// Holds the compiled pattern and the local offset so they are computed once
/// per batch instead of once per record.
#[derive(Debug, Clone)]
pub struct TimeParser {
    pattern: Option<PatternState>,
    local_offset: UtcOffset,
}

#[derive(Debug, Clone)]
enum PatternState {
    Compiled(StrptimePattern),
    /// A pattern was given but cannot be used; nothing parses
    Unusable,
}

impl TimeParser {
    pub fn new(format: Option<&str>) -> Self {
        let pattern = format
            .filter(|f| !f.is_empty())
            .map(|f| match StrptimePattern::compile(f) {
                Some(p) => PatternState::Compiled(p),
                None => {
                    log::warn!("time_format '{}' is not supported; times stay unparsed", f);
                    PatternState::Unusable
                }
            });
        Self {
            pattern,
            local_offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }

    /// Use a fixed offset for epoch conversion instead of the local one
    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.local_offset = offset;
        self
    }

    /// Parse a raw time value into display text and an optional instant
    ///
    /// Never fails: anything that does not parse is displayed as given and
    /// has no instant.
    pub fn parse(&self, value: Option<&FieldValue>) -> ParsedTime {
        let text = match value {
            None | Some(FieldValue::Null) => return ParsedTime::default(),
            Some(FieldValue::DateTime(dt)) => {
                return ParsedTime {
                    display: display_datetime(dt),
                    instant: Some(*dt),
                }
            }
            Some(other) => normalize(Some(other)),
        };

        let text = text.trim_matches('"').trim_matches('\'');
        if text.is_empty() {
            return ParsedTime::default();
        }

        let instant = match &self.pattern {
            Some(PatternState::Compiled(pattern)) => pattern.parse(text),
            Some(PatternState::Unusable) => None,
            None => self.from_epoch(text),
        };

        match instant {
            Some(dt) => ParsedTime {
                display: display_datetime(&dt),
                instant: Some(dt),
            },
            None => ParsedTime::unparsed(text),
        }
    }

    fn from_epoch(&self, text: &str) -> Option<PrimitiveDateTime> {
        let secs: f64 = text.parse().ok()?;
        if !secs.is_finite() {
            return None;
        }
        let nanos = (secs * 1_000_000_000.0).round() as i128;
        let dt = OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()?
            .to_offset(self.local_offset);
        Some(PrimitiveDateTime::new(dt.date(), dt.time()))
    }
}

/// Parse a time value with a one-off parser
pub fn parse_time(value: Option<&FieldValue>, format: Option<&str>) -> ParsedTime {
    TimeParser::new(format).parse(value)
}

/// Canonical "date space time" display, with microseconds only when present
pub fn display_datetime(dt: &PrimitiveDateTime) -> String {
    let formatted = if dt.microsecond() == 0 {
        dt.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
    } else {
        dt.format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
        ))
    };
    formatted.unwrap_or_else(|_| dt.to_string())
}
