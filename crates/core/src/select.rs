//! Root selection: forest roots and ancestor chains
//!
//! Builds the chain of parent processes from a target process up to the
//! top-most id the data mentions.

use crate::index::ProcessIndex;
use crate::models::Warning;
use std::collections::HashSet;

/// Parent id used by the OS for "no parent" (System Idle / kernel)
pub const NO_PARENT_PID: &str = "0";

/// Ids in forest mode that start a tree, in rendering order
///
/// A pid is a root when it has no parent id or its parent has no record.
pub fn forest_roots(index: &ProcessIndex) -> Vec<&str> {
    let mut roots: Vec<&str> = index
        .processes()
        .filter(|(_, meta)| meta.ppid.is_empty() || !index.contains(&meta.ppid))
        .map(|(pid, _)| pid)
        .collect();
    roots.sort_by(|a, b| index.compare(a, b));
    roots.dedup();
    roots
}

/// Result of walking up from a target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestorChain {
    /// Ancestors from the top-most down to the direct parent
    pub ancestors: Vec<String>,
    /// Warnings encountered during the walk
    pub warnings: Vec<Warning>,
}

impl AncestorChain {
    /// First ancestor from the top that has its own record
    ///
    /// Anything above it is known only as a parent id.
    pub fn top_known<'a>(&'a self, index: &ProcessIndex) -> Option<&'a str> {
        self.ancestors
            .iter()
            .map(String::as_str)
            .find(|pid| index.contains(pid))
    }

    /// Ancestors above `top_known` (all of them when nothing is known)
    pub fn unknown_above<'a>(&'a self, index: &ProcessIndex) -> &'a [String] {
        let end = self
            .ancestors
            .iter()
            .position(|pid| index.contains(pid))
            .unwrap_or(self.ancestors.len());
        &self.ancestors[..end]
    }
}

/// Build the ancestor chain for `target`
///
/// Stops at an empty parent id, a self-parented process, an id already on the
/// chain, or a parent without a record (which is still included).
///
/// A parent id of `0` without a record of its own ends the chain without being
/// included. Operating systems report `0` as the parent of top-level processes
/// (the idle/swapper slot), so it marks "no parent" rather than a missing
/// ancestor, and a process whose ppid is `0` starts its tree with no stub line
/// above it. A `0` that does have a record is walked like any other id.
pub fn ancestor_chain(index: &ProcessIndex, target: &str) -> AncestorChain {
    let mut chain = AncestorChain::default();
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(target);
    let mut current = target;

    while let Some(meta) = index.get(current) {
        let parent = meta.ppid.as_str();
        if parent.is_empty() || parent == current {
            break;
        }
        if parent == NO_PARENT_PID && !index.contains(parent) {
            break;
        }
        if !visited.insert(parent) {
            chain.warnings.push(Warning::AncestorCycle {
                pid: parent.to_string(),
            });
            break;
        }
        chain.ancestors.push(parent.to_string());
        if !index.contains(parent) {
            break;
        }
        current = parent;
    }

    chain.ancestors.reverse();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::FieldMap;
    use crate::models::{FieldValue, Record};

    fn record(pid: &str, ppid: &str, t: Option<i64>) -> Record {
        let mut r = Record::new();
        r.insert("pid".into(), FieldValue::from(pid));
        r.insert("ppid".into(), FieldValue::from(ppid));
        r.insert("path".into(), FieldValue::from(format!("proc{}.exe", pid)));
        r.insert("cmd".into(), FieldValue::from(""));
        if let Some(t) = t {
            r.insert("t".into(), FieldValue::Integer(t));
        }
        r
    }

    fn build(records: &[Record]) -> ProcessIndex {
        let fields = FieldMap {
            pid: "pid",
            ppid: "ppid",
            path: "path",
            cmd: "cmd",
            time: Some("t"),
            time_format: None,
            ppath: None,
        };
        ProcessIndex::build(records, &fields, None)
    }

    /// Create a fake process table for testing
    fn fake_table() -> ProcessIndex {
        build(&[
            record("4", "0", Some(1)),
            record("100", "4", Some(2)),
            record("200", "100", Some(3)),
            record("300", "200", Some(4)),
            record("400", "300", Some(5)),
            record("50", "", None),
            record("60", "999", Some(0)),
            record("70", "60", Some(6)),
        ])
    }

    #[test]
    fn test_forest_roots() {
        let index = fake_table();
        assert_eq!(forest_roots(&index), vec!["60", "4", "50"]);
    }

    #[test]
    fn test_chain_stops_at_idle_parent() {
        let index = fake_table();
        let chain = ancestor_chain(&index, "400");
        assert_eq!(chain.ancestors, vec!["4", "100", "200", "300"]);
        assert_eq!(chain.top_known(&index), Some("4"));
        assert!(chain.unknown_above(&index).is_empty());
        assert!(chain.warnings.is_empty());
    }

    #[test]
    fn test_chain_includes_unknown_parent() {
        let index = fake_table();
        let chain = ancestor_chain(&index, "70");
        assert_eq!(chain.ancestors, vec!["999", "60"]);
        assert_eq!(chain.top_known(&index), Some("60"));
        assert_eq!(chain.unknown_above(&index), ["999".to_string()]);
    }

    #[test]
    fn test_idle_parent_with_record_is_walked() {
        let index = build(&[record("0", "0", None), record("4", "0", None)]);
        let chain = ancestor_chain(&index, "4");
        assert_eq!(chain.ancestors, vec!["0"]);
    }

    #[test]
    fn test_chain_for_root_is_empty() {
        let index = fake_table();
        let chain = ancestor_chain(&index, "50");
        assert!(chain.ancestors.is_empty());
        assert_eq!(chain.top_known(&index), None);
        assert!(chain.unknown_above(&index).is_empty());
    }

    #[test]
    fn test_self_parented_process() {
        let index = build(&[record("999", "999", None)]);
        let chain = ancestor_chain(&index, "999");
        assert!(chain.ancestors.is_empty());
    }

    #[test]
    fn test_two_cycle_terminates() {
        let index = build(&[record("500", "501", None), record("501", "500", None)]);
        let chain = ancestor_chain(&index, "500");
        assert_eq!(chain.ancestors, vec!["501"]);
        assert_eq!(
            chain.warnings,
            vec![Warning::AncestorCycle {
                pid: "500".to_string()
            }]
        );
    }

    #[test]
    fn test_longer_cycle_never_repeats() {
        let index = build(&[
            record("1", "3", None),
            record("2", "1", None),
            record("3", "2", None),
            record("4", "3", None),
        ]);
        let chain = ancestor_chain(&index, "4");
        assert_eq!(chain.ancestors, vec!["1", "2", "3"]);
        let unique: HashSet<_> = chain.ancestors.iter().collect();
        assert_eq!(unique.len(), chain.ancestors.len());
    }

    #[test]
    fn test_missing_target_has_no_chain() {
        let index = fake_table();
        assert!(ancestor_chain(&index, "12345").ancestors.is_empty());
    }
}
