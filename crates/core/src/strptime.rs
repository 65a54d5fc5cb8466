//! strptime-style pattern support on top of `time` format descriptions

use time::format_description::OwnedFormatItem;
use time::macros::date;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// A compiled strptime pattern
#[derive(Debug, Clone)]
pub struct StrptimePattern {
    items: OwnedFormatItem,
    has_offset: bool,
    /// `%z` is the last directive, so `Z` and `+HH:MM` suffixes can be rewritten
    offset_at_end: bool,
}

/// Date used for patterns without a date part, as strptime does
const DEFAULT_DATE: Date = date!(1900-01-01);

impl StrptimePattern {
    /// Compile a pattern such as `%Y-%m-%d %H:%M:%S`
    ///
    /// Returns `None` for unsupported directives; callers treat that as
    /// "every value is unparsed".
    pub fn compile(pattern: &str) -> Option<Self> {
        let description = translate(pattern)?;
        let items = time::format_description::parse_owned::<1>(&description).ok()?;
        Some(Self {
            items,
            has_offset: pattern.contains("%z"),
            offset_at_end: pattern.ends_with("%z"),
        })
    }

    /// Parse `value` strictly; the whole string must match
    pub fn parse(&self, value: &str) -> Option<PrimitiveDateTime> {
        if self.has_offset {
            let value = if self.offset_at_end {
                compact_offset(value)
            } else {
                value.to_string()
            };
            let dt = OffsetDateTime::parse(&value, &self.items).ok()?;
            let utc = dt.to_offset(UtcOffset::UTC);
            return Some(PrimitiveDateTime::new(utc.date(), utc.time()));
        }
        if let Ok(dt) = PrimitiveDateTime::parse(value, &self.items) {
            return Some(dt);
        }
        // Date-only patterns
        if let Ok(date) = Date::parse(value, &self.items) {
            return Some(PrimitiveDateTime::new(date, Time::MIDNIGHT));
        }
        // Time-only patterns
        Time::parse(value, &self.items)
            .ok()
            .map(|time| PrimitiveDateTime::new(DEFAULT_DATE, time))
    }
}

/// Rewrite a trailing `Z` or `+HH:MM` offset as `+HHMM`
fn compact_offset(value: &str) -> String {
    if let Some(rest) = value.strip_suffix('Z') {
        return format!("{}+0000", rest);
    }
    let bytes = value.as_bytes();
    let n = bytes.len();
    if n >= 6
        && matches!(bytes[n - 6], b'+' | b'-')
        && bytes[n - 3] == b':'
        && [n - 5, n - 4, n - 2, n - 1]
            .iter()
            .all(|&i| bytes[i].is_ascii_digit())
    {
        return format!("{}{}", &value[..n - 3], &value[n - 2..]);
    }
    value.to_string()
}

/// Translate strptime directives to a version 1 `time` format description
fn translate(pattern: &str) -> Option<String> {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => {
                let directive = chars.next()?;
                out.push_str(component(directive)?);
            }
            '[' => out.push_str("[["),
            other => out.push(other),
        }
    }
    Some(out)
}

fn component(directive: char) -> Option<&'static str> {
    Some(match directive {
        'Y' => "[year]",
        // strptime accepts one or two digits for these
        'm' => "[month padding:none]",
        'd' => "[day padding:none]",
        'e' => "[day padding:space]",
        'H' => "[hour padding:none]",
        'I' => "[hour repr:12 padding:none]",
        'M' => "[minute padding:none]",
        'S' => "[second padding:none]",
        'f' => "[subsecond]",
        'p' => "[period case_sensitive:false]",
        'b' | 'h' => "[month repr:short case_sensitive:false]",
        'B' => "[month repr:long case_sensitive:false]",
        'a' => "[weekday repr:short case_sensitive:false]",
        'A' => "[weekday case_sensitive:false]",
        'j' => "[ordinal padding:none]",
        'z' => "[offset_hour sign:mandatory][offset_minute]",
        'T' => "[hour]:[minute]:[second]",
        'F' => "[year]-[month]-[day]",
        'R' => "[hour]:[minute]",
        '%' => "%",
        _ => return None,
    })
}
