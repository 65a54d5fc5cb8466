//! Fixed-width node line formatting

use crate::models::ProcessMeta;

/// Width of the pid column
pub const PID_WIDTH: usize = 6;
/// Width of the path column; longer paths are cut on the right
pub const PATH_WIDTH: usize = 50;
/// Width of the time column
pub const TIME_WIDTH: usize = 23;

/// Marker appended to truncated command lines
pub const ELLIPSIS: char = '…';

/// Formats the columns of one node line
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat {
    /// Maximum command line characters, ellipsis included
    pub truncate_cmd: Option<usize>,
}

impl LineFormat {
    pub fn new(truncate_cmd: Option<usize>) -> Self {
        Self {
            truncate_cmd: truncate_cmd.filter(|&n| n > 0),
        }
    }

    /// `<pid:6> <path:50> <time:23> <cmd>`
    pub fn format(&self, pid: &str, meta: &ProcessMeta) -> String {
        let path = take_chars(&clean_text(&meta.path), PATH_WIDTH);
        let time = take_chars(&meta.time.display, TIME_WIDTH);
        let cmd = truncate(&clean_text(&meta.cmd), self.truncate_cmd);
        format!(
            "{:<pid_w$} {:<path_w$} {:<time_w$} {}",
            pid,
            path,
            time,
            cmd,
            pid_w = PID_WIDTH,
            path_w = PATH_WIDTH,
            time_w = TIME_WIDTH
        )
    }
}

/// Collapse line breaks, tabs and runs of whitespace into single spaces
pub fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `s` to `limit` characters, the last one being an ellipsis
pub fn truncate(s: &str, limit: Option<usize>) -> String {
    match limit {
        Some(limit) if limit > 0 && s.chars().count() > limit => {
            let mut out = take_chars(s, limit - 1);
            out.push(ELLIPSIS);
            out
        }
        _ => s.to_string(),
    }
}

fn take_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}
