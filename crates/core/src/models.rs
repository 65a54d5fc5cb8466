//! Core domain models for ptree
//!
//! These types describe raw input records, the per-process metadata kept by
//! the index, and the lines produced while rendering a tree.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::PrimitiveDateTime;

/// A raw input record: field name -> value
pub type Record = HashMap<String, FieldValue>;

/// A single field value as supplied by a record source
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Absent or explicit null
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integral number (ids, epoch seconds)
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Free text
    Text(String),
    /// Already-structured date and time
    #[serde(skip)]
    DateTime(PrimitiveDateTime),
    /// Anything else (arrays, objects)
    Other(serde_json::Value),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<PrimitiveDateTime> for FieldValue {
    fn from(value: PrimitiveDateTime) -> Self {
        FieldValue::DateTime(value)
    }
}

/// A creation time as shown to the user plus its sortable instant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTime {
    /// Text shown in the time column
    pub display: String,
    /// Instant used for ordering; `None` when the value could not be parsed
    pub instant: Option<PrimitiveDateTime>,
}

impl ParsedTime {
    /// A time that is displayed verbatim but cannot be sorted on
    pub fn unparsed(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            instant: None,
        }
    }
}

/// Everything retained about one process id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessMeta {
    /// Parent process id (empty when unknown)
    pub ppid: String,
    /// Executable path or image name
    pub path: String,
    /// Command line
    pub cmd: String,
    /// Creation time
    pub time: ParsedTime,
}

impl ProcessMeta {
    /// Placeholder metadata for an ancestor that has no record of its own
    pub fn unknown_ancestor(path_hint: Option<&str>) -> Self {
        Self {
            ppid: String::new(),
            path: path_hint.unwrap_or(UNKNOWN_PARENT_PATH).to_string(),
            cmd: String::new(),
            time: ParsedTime::unparsed(UNKNOWN_TIME),
        }
    }
}

/// Path shown for an ancestor with neither a record nor a path hint
pub const UNKNOWN_PARENT_PATH: &str = "[parent not in events/time range]";

/// Time shown for an ancestor with no record
pub const UNKNOWN_TIME: &str = "[unknown]";

/// The process a targeted run was asked about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Target process id
    pub pid: String,
    /// Path from the target's retained record
    pub path: String,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "PID {}", self.pid)
        } else {
            write!(f, "PID {} ({})", self.pid, self.path)
        }
    }
}

/// How a rendered line relates to the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Root of a rendered tree
    Root,
    /// Descendant of a root
    Descendant,
    /// Flat ancestor line printed above the root
    Ancestor,
    /// Ancestor that exists only as a parent id
    UnknownAncestor,
}

/// One line of rendered output with its structured attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// Full text including the tree-drawing prefix
    pub text: String,
    /// Tree-drawing prefix alone (guides plus branch marker)
    pub tree_prefix: String,
    pub pid: String,
    pub ppid: String,
    pub path: String,
    pub cmd: String,
    pub time: String,
    /// Distance from the rendered root
    pub depth: usize,
    pub kind: LineKind,
}

impl RenderedLine {
    /// Whether this line is the root of its tree
    pub fn is_root(&self) -> bool {
        self.kind == LineKind::Root
    }
}

/// Non-fatal problems noticed while building a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details", rename_all = "snake_case")]
pub enum Warning {
    /// The ancestor walk met an id it had already visited
    AncestorCycle { pid: String },
    /// A descendant was already on the current path and was not expanded
    DescendantCycle { pid: String },
    /// `root_path` was given without `root_pid`
    RootPathIgnored { path: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::AncestorCycle { pid } => {
                write!(f, "Cycle detected in ancestry at PID {}", pid)
            }
            Warning::DescendantCycle { pid } => {
                write!(f, "PID {} is its own ancestor; subtree not expanded again", pid)
            }
            Warning::RootPathIgnored { path } => {
                write!(f, "root_path {} ignored in forest mode", path)
            }
        }
    }
}
