//! Error types for tree reconstruction

use thiserror::Error;

/// Errors that stop a run before anything is rendered
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PtreeError {
    /// The target pid has no record in the input
    #[error("Target PID {} not found in events.", or_empty(.pid))]
    TargetNotFound { pid: String },

    /// Strict targeting was requested and no record matched both pid and path
    #[error("Target PID {} with path {} not found in events.", or_empty(.pid), or_empty(.path))]
    TargetPathMismatch { pid: String, path: String },

    /// A required option was left empty
    #[error("Missing required option: {0}")]
    MissingOption(&'static str),
}

impl PtreeError {
    /// Check if this error means the requested target could not be resolved
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PtreeError::TargetNotFound { .. } | PtreeError::TargetPathMismatch { .. }
        )
    }
}

fn or_empty(s: &str) -> &str {
    if s.is_empty() {
        "<empty>"
    } else {
        s
    }
}

/// Result type for ptree operations
pub type PtreeResult<T> = Result<T, PtreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = PtreeError::TargetNotFound {
            pid: "12".to_string(),
        };
        assert_eq!(err.to_string(), "Target PID 12 not found in events.");

        let err = PtreeError::TargetPathMismatch {
            pid: "3".to_string(),
            path: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "Target PID 3 with path <empty> not found in events."
        );
        assert!(err.is_not_found());
        assert!(!PtreeError::MissingOption("pid_field").is_not_found());
    }
}
