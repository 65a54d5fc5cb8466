//! Run options: field names, target selection and formatting flags

use crate::error::{PtreeError, PtreeResult};
use serde::{Deserialize, Deserializer, Serialize};

/// Output shape requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// One aggregated result with the whole tree text
    #[default]
    Tree,
    /// One structured result per rendered line
    Table,
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tree" => Ok(OutputMode::Tree),
            "table" => Ok(OutputMode::Table),
            other => Err(format!("unknown mode '{}' (expected tree or table)", other)),
        }
    }
}

/// All options recognized by a run
///
/// Older field-name options (`child_name`, `parent_name`, ...) are accepted as
/// aliases when deserializing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PtreeOptions {
    #[serde(alias = "child_name")]
    pub pid_field: String,
    #[serde(alias = "parent_name")]
    pub ppid_field: String,
    #[serde(alias = "Process_name")]
    pub path_field: String,
    #[serde(alias = "CommandLine_name")]
    pub cmd_field: String,
    /// Creation time field (text or epoch seconds)
    #[serde(alias = "CreateTime_name")]
    pub time_field: Option<String>,
    /// strptime-style pattern for `time_field`
    #[serde(alias = "CreateTime_name_format")]
    pub time_format: Option<String>,
    /// Field holding the parent's path, used when the parent has no record
    pub ppath_field: Option<String>,
    /// Target process id; empty selects forest mode
    pub root_pid: String,
    /// Expected path of the target; enables strict targeting
    pub root_path: String,
    pub mode: OutputMode,
    /// Maximum command line characters; `None` means unlimited
    #[serde(deserialize_with = "lenient_limit")]
    pub truncate_cmd: Option<usize>,
    #[serde(deserialize_with = "lenient_bool_false")]
    pub suppress_unknown_ancestors: bool,
    #[serde(deserialize_with = "lenient_bool_true")]
    pub start_from_root: bool,
}

impl Default for PtreeOptions {
    fn default() -> Self {
        Self {
            pid_field: "pid".to_string(),
            ppid_field: "ppid".to_string(),
            path_field: "path".to_string(),
            cmd_field: "cmd".to_string(),
            time_field: None,
            time_format: None,
            ppath_field: None,
            root_pid: String::new(),
            root_path: String::new(),
            mode: OutputMode::Tree,
            truncate_cmd: None,
            suppress_unknown_ancestors: false,
            start_from_root: true,
        }
    }
}

impl PtreeOptions {
    /// Check that every required field name is present
    pub fn validate(&self) -> PtreeResult<()> {
        let required = [
            ("pid_field", &self.pid_field),
            ("ppid_field", &self.ppid_field),
            ("path_field", &self.path_field),
            ("cmd_field", &self.cmd_field),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(PtreeError::MissingOption(name));
            }
        }
        Ok(())
    }

    /// Target selection derived from `root_pid` / `root_path`
    pub fn target_filter(&self) -> Option<TargetFilter> {
        let pid = self.root_pid.trim();
        if pid.is_empty() {
            return None;
        }
        let path = self.root_path.trim();
        Some(TargetFilter {
            pid: pid.to_string(),
            expected_path: (!path.is_empty()).then(|| path.to_string()),
        })
    }

    /// Non-empty optional field name
    pub(crate) fn optional_field(field: &Option<String>) -> Option<&str> {
        field.as_deref().map(str::trim).filter(|f| !f.is_empty())
    }
}

/// The target of a targeted run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFilter {
    pub pid: String,
    /// When set, records for `pid` must carry exactly this path
    pub expected_path: Option<String>,
}

impl TargetFilter {
    /// Whether strict pid + path matching is active
    pub fn is_strict(&self) -> bool {
        self.expected_path.is_some()
    }

    /// True when a record for the target pid has to be ignored
    pub fn rejects(&self, pid: &str, path: &str) -> bool {
        match &self.expected_path {
            Some(expected) => pid == self.pid && path != expected,
            None => false,
        }
    }
}

/// Parse a truncation limit; zero, negative or malformed values mean unlimited
pub fn parse_truncate_limit(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Some(n as usize),
        Ok(_) => None,
        Err(_) => {
            log::warn!("truncate_cmd '{}' is not a number; not truncating", raw);
            None
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LimitRepr {
    Int(i64),
    Text(String),
    Other(serde_json::Value),
}

fn lenient_limit<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LimitRepr::deserialize(deserializer)? {
        LimitRepr::Int(n) if n > 0 => Some(n as usize),
        LimitRepr::Int(_) => None,
        LimitRepr::Text(s) => parse_truncate_limit(&s),
        LimitRepr::Other(_) => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolRepr {
    Bool(bool),
    Text(String),
    Other(serde_json::Value),
}

fn lenient_bool<'de, D>(deserializer: D, default: bool) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match BoolRepr::deserialize(deserializer)? {
        BoolRepr::Bool(b) => b,
        BoolRepr::Text(s) => parse_flag(&s).unwrap_or(default),
        BoolRepr::Other(_) => default,
    })
}

fn lenient_bool_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    lenient_bool(deserializer, false)
}

fn lenient_bool_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    lenient_bool(deserializer, true)
}

/// Parse a "true"/"false" flag, case-insensitively
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
