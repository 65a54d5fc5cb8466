//! Output assembly: one tree result, one row per line, or one error

use crate::error::PtreeResult;
use crate::models::RenderedLine;
use crate::options::OutputMode;
use crate::render::render_tree;
use crate::report::Report;
use serde::{Deserialize, Serialize};

/// The single result of tree mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeResult {
    /// Full newline-joined tree text
    pub tree: String,
    /// Resolved target pid (empty in forest mode)
    pub target_pid: String,
    /// Resolved target path (empty in forest mode)
    pub target_path: String,
}

/// One row of table mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub line: String,
    pub tree_prefix: String,
    pub pid: String,
    pub ppid: String,
    pub path: String,
    pub cmd: String,
    pub time: String,
    pub depth: usize,
    pub is_root: bool,
}

impl From<&RenderedLine> for TableRow {
    fn from(line: &RenderedLine) -> Self {
        Self {
            line: line.text.clone(),
            tree_prefix: line.tree_prefix.clone(),
            pid: line.pid.clone(),
            ppid: line.ppid.clone(),
            path: line.path.clone(),
            cmd: line.cmd.clone(),
            time: line.time.clone(),
            depth: line.depth,
            is_root: line.is_root(),
        }
    }
}

/// A run that could not be rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    #[serde(rename = "_error")]
    pub error: String,
}

impl ErrorResult {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// A record handed to the result sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputRecord {
    Tree(TreeResult),
    Row(TableRow),
    Error(ErrorResult),
}

/// Turn a report into result records for the requested mode
pub fn assemble(report: &Report, mode: OutputMode) -> Vec<OutputRecord> {
    match mode {
        OutputMode::Tree => {
            let (target_pid, target_path) = report
                .target
                .as_ref()
                .map(|t| (t.pid.clone(), t.path.clone()))
                .unwrap_or_default();
            vec![OutputRecord::Tree(TreeResult {
                tree: render_tree(report),
                target_pid,
                target_path,
            })]
        }
        OutputMode::Table => report
            .lines()
            .map(|line| OutputRecord::Row(TableRow::from(line)))
            .collect(),
    }
}

/// Like [`assemble`], turning a failed run into a single error record
pub fn assemble_result(result: &PtreeResult<Report>, mode: OutputMode) -> Vec<OutputRecord> {
    match result {
        Ok(report) => assemble(report, mode),
        Err(err) => vec![OutputRecord::Error(ErrorResult::new(err.to_string()))],
    }
}
