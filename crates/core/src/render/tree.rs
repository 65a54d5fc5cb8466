//! Depth-first tree rendering

use crate::index::ProcessIndex;
use crate::models::{LineKind, ProcessMeta, RenderedLine, Warning};
use crate::render::line::LineFormat;
use std::collections::HashSet;

/// Branch marker for a child that has later siblings
pub const BRANCH: &str = "├── ";
/// Branch marker for the last child
pub const LAST_BRANCH: &str = "└── ";
/// Guide continuing past a non-last child
pub const PIPE: &str = "│   ";
/// Blank guide below a last child
pub const SPACE: &str = "    ";

/// Lines and warnings accumulated while rendering
#[derive(Debug, Default)]
pub struct RenderOutput {
    pub lines: Vec<RenderedLine>,
    pub warnings: Vec<Warning>,
}

enum Step<'a> {
    Enter {
        pid: &'a str,
        depth: usize,
        prefix: String,
        last: bool,
    },
    Leave(&'a str),
}

/// Renders trees from a process index
pub struct TreeRenderer<'a> {
    index: &'a ProcessIndex,
    format: LineFormat,
}

impl<'a> TreeRenderer<'a> {
    pub fn new(index: &'a ProcessIndex, format: LineFormat) -> Self {
        Self { index, format }
    }

    /// Render `root` at depth 0 followed by all of its descendants
    ///
    /// Walks with an explicit stack and keeps the set of ids on the current
    /// path; an id met again below itself is printed but not expanded.
    pub fn render<'r>(&self, root: &'r str, out: &mut RenderOutput)
    where
        'a: 'r,
    {
        let root_meta = self.meta_or_default(root);
        out.lines
            .push(self.line(root, &root_meta, 0, LineKind::Root, "", ""));

        let mut on_path: HashSet<&str> = HashSet::new();
        on_path.insert(root);
        let mut stack = vec![Step::Leave(root)];
        self.push_children(&mut stack, root, 1, String::new());

        while let Some(step) = stack.pop() {
            match step {
                Step::Leave(pid) => {
                    on_path.remove(pid);
                }
                Step::Enter {
                    pid,
                    depth,
                    prefix,
                    last,
                } => {
                    let meta = self.meta_or_default(pid);
                    let branch = if last { LAST_BRANCH } else { BRANCH };
                    out.lines.push(self.line(
                        pid,
                        &meta,
                        depth,
                        LineKind::Descendant,
                        &prefix,
                        branch,
                    ));

                    if !on_path.insert(pid) {
                        log::debug!("pid {} already on the current path", pid);
                        out.warnings.push(Warning::DescendantCycle {
                            pid: pid.to_string(),
                        });
                        continue;
                    }
                    stack.push(Step::Leave(pid));
                    let guide = if last { SPACE } else { PIPE };
                    self.push_children(&mut stack, pid, depth + 1, prefix + guide);
                }
            }
        }
    }

    /// A flat line above the tree for an ancestor
    pub fn ancestor(&self, pid: &str, meta: &ProcessMeta, known: bool) -> RenderedLine {
        let kind = if known {
            LineKind::Ancestor
        } else {
            LineKind::UnknownAncestor
        };
        self.line(pid, meta, 0, kind, "", "")
    }

    fn push_children<'r>(&self, stack: &mut Vec<Step<'r>>, pid: &str, depth: usize, prefix: String)
    where
        'a: 'r,
    {
        let kids = self.index.sorted_children(pid);
        let count = kids.len();
        // Reversed so the first child is popped first
        for (i, kid) in kids.into_iter().enumerate().rev() {
            stack.push(Step::Enter {
                pid: kid,
                depth,
                prefix: prefix.clone(),
                last: i + 1 == count,
            });
        }
    }

    fn meta_or_default(&self, pid: &str) -> ProcessMeta {
        self.index.get(pid).cloned().unwrap_or_default()
    }

    fn line(
        &self,
        pid: &str,
        meta: &ProcessMeta,
        depth: usize,
        kind: LineKind,
        prefix: &str,
        branch: &str,
    ) -> RenderedLine {
        let tree_prefix = format!("{}{}", prefix, branch);
        RenderedLine {
            text: format!("{}{}", tree_prefix, self.format.format(pid, meta)),
            tree_prefix,
            pid: pid.to_string(),
            ppid: meta.ppid.clone(),
            path: meta.path.clone(),
            cmd: meta.cmd.clone(),
            time: meta.time.display.clone(),
            depth,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::FieldMap;
    use crate::models::{FieldValue, Record};

    fn record(pid: &str, ppid: &str, t: i64) -> Record {
        let mut r = Record::new();
        r.insert("pid".into(), FieldValue::from(pid));
        r.insert("ppid".into(), FieldValue::from(ppid));
        r.insert("path".into(), FieldValue::from(format!("p{}", pid)));
        r.insert("cmd".into(), FieldValue::from(format!("c{}", pid)));
        r.insert("t".into(), FieldValue::Integer(t));
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

    fn render(index: &ProcessIndex, root: &str) -> RenderOutput {
        let mut out = RenderOutput::default();
        TreeRenderer::new(index, LineFormat::default()).render(root, &mut out);
        out
    }

    #[test]
    fn test_prefixes_follow_sibling_position() {
        // 1
        // ├── 2
        // │   └── 4
        // └── 3
        //     └── 5
        let index = build(&[
            record("1", "", 1),
            record("2", "1", 2),
            record("3", "1", 3),
            record("4", "2", 4),
            record("5", "3", 5),
        ]);
        let out = render(&index, "1");
        let shape: Vec<(&str, &str, usize)> = out
            .lines
            .iter()
            .map(|l| (l.pid.as_str(), l.tree_prefix.as_str(), l.depth))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("1", "", 0),
                ("2", "├── ", 1),
                ("4", "│   └── ", 2),
                ("3", "└── ", 1),
                ("5", "    └── ", 2),
            ]
        );
        assert!(out.lines[0].is_root());
        assert!(out.lines[1..].iter().all(|l| !l.is_root()));
        assert!(out.lines[2].text.starts_with("│   └── 4"));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_cycle_below_root_terminates() {
        let index = build(&[record("500", "501", 1), record("501", "500", 2)]);
        let out = render(&index, "501");
        let pids: Vec<&str> = out.lines.iter().map(|l| l.pid.as_str()).collect();
        assert_eq!(pids, vec!["501", "500", "501"]);
        assert_eq!(
            out.warnings,
            vec![Warning::DescendantCycle {
                pid: "501".to_string()
            }]
        );
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut records = vec![record("0", "", 0)];
        for i in 1..2000 {
            records.push(record(&i.to_string(), &(i - 1).to_string(), i));
        }
        let index = build(&records);
        let out = render(&index, "0");
        assert_eq!(out.lines.len(), 2000);
        assert_eq!(out.lines[1999].depth, 1999);
    }

    #[test]
    fn test_missing_root_meta_renders_stub() {
        let index = build(&[record("2", "9", 1)]);
        let out = render(&index, "9");
        assert_eq!(out.lines[0].path, "");
        assert_eq!(out.lines[1].pid, "2");
    }
}
