//! Report structure: the rendered trees of one run

use crate::error::{PtreeError, PtreeResult};
use crate::index::{FieldMap, ProcessIndex};
use crate::models::{ProcessMeta, Record, RenderedLine, Target, Warning};
use crate::options::{PtreeOptions, TargetFilter};
use crate::render::line::LineFormat;
use crate::render::tree::{RenderOutput, TreeRenderer};
use crate::select::{ancestor_chain, forest_roots};

/// Complete result of a run, before output assembly
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// The resolved target (None in forest mode)
    pub target: Option<Target>,
    /// One block of lines per rendered tree
    pub blocks: Vec<Vec<RenderedLine>>,
    /// Warnings about malformed data
    pub warnings: Vec<Warning>,
}

impl Report {
    /// Whether this report covers every root rather than one target
    pub fn is_forest(&self) -> bool {
        self.target.is_none()
    }

    /// All lines in output order, without tree separators
    pub fn lines(&self) -> impl Iterator<Item = &RenderedLine> {
        self.blocks.iter().flatten()
    }

    /// Check if any warnings were raised
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Add a warning to the report
    pub fn add_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }
}

/// Index `records` and render either the forest or the targeted tree
pub fn build_report(records: &[Record], options: &PtreeOptions) -> PtreeResult<Report> {
    options.validate()?;
    log::debug!("building report from {} records", records.len());

    let filter = options.target_filter();
    let fields = FieldMap::from_options(options);
    let index = ProcessIndex::build(records, &fields, filter.as_ref());
    let renderer = TreeRenderer::new(&index, LineFormat::new(options.truncate_cmd));

    match filter {
        None => Ok(build_forest(&index, &renderer, options)),
        Some(filter) => build_targeted(&index, &renderer, &filter, options),
    }
}

fn build_forest(index: &ProcessIndex, renderer: &TreeRenderer<'_>, options: &PtreeOptions) -> Report {
    let mut report = Report::default();

    let root_path = options.root_path.trim();
    if !root_path.is_empty() {
        log::info!("root_path provided without root_pid; ignoring root_path in forest mode");
        report.add_warning(Warning::RootPathIgnored {
            path: root_path.to_string(),
        });
    }

    let roots = forest_roots(index);
    log::debug!("forest has {} roots", roots.len());
    for root in roots {
        let mut out = RenderOutput::default();
        renderer.render(root, &mut out);
        report.blocks.push(out.lines);
        report.warnings.extend(out.warnings);
    }
    report
}

fn build_targeted(
    index: &ProcessIndex,
    renderer: &TreeRenderer<'_>,
    filter: &TargetFilter,
    options: &PtreeOptions,
) -> PtreeResult<Report> {
    let pid = filter.pid.as_str();
    let target_meta = match (index.get(pid), &filter.expected_path) {
        (Some(meta), Some(expected)) if &meta.path == expected => meta,
        (_, Some(expected)) => {
            return Err(PtreeError::TargetPathMismatch {
                pid: pid.to_string(),
                path: expected.clone(),
            })
        }
        (Some(meta), None) => meta,
        (None, None) => {
            return Err(PtreeError::TargetNotFound {
                pid: pid.to_string(),
            })
        }
    };

    let chain = ancestor_chain(index, pid);
    let hide_unknown = options.suppress_unknown_ancestors;
    let mut out = RenderOutput::default();

    let stub = |ancestor: &str| {
        let meta = ProcessMeta::unknown_ancestor(index.parent_hint(ancestor));
        renderer.ancestor(ancestor, &meta, false)
    };

    match chain.top_known(index) {
        Some(top) if options.start_from_root => {
            if !hide_unknown {
                for ancestor in chain.unknown_above(index) {
                    out.lines.push(stub(ancestor.as_str()));
                }
            }
            renderer.render(top, &mut out);
        }
        _ => {
            for ancestor in &chain.ancestors {
                match index.get(ancestor) {
                    Some(meta) => out.lines.push(renderer.ancestor(ancestor, meta, true)),
                    None if hide_unknown => {}
                    None => out.lines.push(stub(ancestor.as_str())),
                }
            }
            renderer.render(pid, &mut out);
        }
    }

    let mut report = Report {
        target: Some(Target {
            pid: pid.to_string(),
            path: target_meta.path.clone(),
        }),
        blocks: vec![out.lines],
        warnings: chain.warnings,
    };
    report.warnings.extend(out.warnings);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldValue, LineKind, UNKNOWN_PARENT_PATH};

    fn record(pid: &str, ppid: &str, path: &str, t: i64) -> Record {
        let mut r = Record::new();
        r.insert("pid".into(), FieldValue::from(pid));
        r.insert("ppid".into(), FieldValue::from(ppid));
        r.insert("path".into(), FieldValue::from(path));
        r.insert("cmd".into(), FieldValue::from(path));
        r.insert("t".into(), FieldValue::Integer(t));
        r
    }

    fn options(root_pid: &str) -> PtreeOptions {
        PtreeOptions {
            time_field: Some("t".to_string()),
            ppath_field: Some("ppath".to_string()),
            root_pid: root_pid.to_string(),
            ..Default::default()
        }
    }

    /// 7 (no record) -> 10 -> 20 -> {30, 31}
    fn sample() -> Vec<Record> {
        let mut first = record("10", "7", "C:\\Windows\\explorer.exe", 1);
        first.insert("ppath".into(), FieldValue::from("C:\\Windows\\userinit.exe"));
        vec![
            first,
            record("20", "10", "C:\\cmd.exe", 2),
            record("30", "20", "C:\\a.exe", 3),
            record("31", "20", "C:\\b.exe", 4),
        ]
    }

    fn pids(report: &Report) -> Vec<&str> {
        report.lines().map(|l| l.pid.as_str()).collect()
    }

    #[test]
    fn test_start_from_root_prints_unknown_stub() {
        let report = build_report(&sample(), &options("20")).unwrap();
        assert_eq!(pids(&report), vec!["7", "10", "20", "30", "31"]);

        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines[0].kind, LineKind::UnknownAncestor);
        assert_eq!(lines[0].path, "C:\\Windows\\userinit.exe");
        assert_eq!(lines[0].time, "[unknown]");
        assert!(lines[1].is_root());
        assert_eq!(lines[2].depth, 1);
        assert_eq!(
            report.target,
            Some(Target {
                pid: "20".into(),
                path: "C:\\cmd.exe".into()
            })
        );
    }

    #[test]
    fn test_suppress_unknown_ancestors() {
        let opts = PtreeOptions {
            suppress_unknown_ancestors: true,
            ..options("20")
        };
        let report = build_report(&sample(), &opts).unwrap();
        assert_eq!(pids(&report), vec!["10", "20", "30", "31"]);
    }

    #[test]
    fn test_start_from_target() {
        let opts = PtreeOptions {
            start_from_root: false,
            ..options("20")
        };
        let report = build_report(&sample(), &opts).unwrap();
        assert_eq!(pids(&report), vec!["7", "10", "20", "30", "31"]);
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines[0].kind, LineKind::UnknownAncestor);
        assert_eq!(lines[1].kind, LineKind::Ancestor);
        assert!(lines[2].is_root());
        assert_eq!(lines[2].pid, "20");
        assert_eq!(lines[3].tree_prefix, "├── ");
        assert_eq!(lines[4].tree_prefix, "└── ");
    }

    #[test]
    fn test_only_unknown_parent_falls_back_to_target_root() {
        let records = vec![record("5", "9", "C:\\x.exe", 1)];
        let report = build_report(&records, &options("5")).unwrap();
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].pid, "9");
        assert_eq!(lines[0].path, UNKNOWN_PARENT_PATH);
        assert!(lines[1].is_root());
    }

    #[test]
    fn test_target_not_found() {
        let err = build_report(&sample(), &options("404")).unwrap_err();
        assert_eq!(
            err,
            PtreeError::TargetNotFound {
                pid: "404".to_string()
            }
        );
    }

    #[test]
    fn test_forest_blocks_and_root_path_warning() {
        let mut records = sample();
        records.push(record("99", "", "C:\\other.exe", 0));
        let opts = PtreeOptions {
            root_path: "C:\\ignored.exe".to_string(),
            ..options("")
        };
        let report = build_report(&records, &opts).unwrap();
        assert!(report.is_forest());
        assert_eq!(report.blocks.len(), 2);
        assert_eq!(report.blocks[0][0].pid, "99");
        assert_eq!(report.blocks[1][0].pid, "10");
        assert!(crate::render::render_tree(&report).contains("\n\n"));
        assert_eq!(
            report.warnings,
            vec![Warning::RootPathIgnored {
                path: "C:\\ignored.exe".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_option_is_an_error() {
        let opts = PtreeOptions {
            pid_field: String::new(),
            ..Default::default()
        };
        assert_eq!(
            build_report(&[], &opts).unwrap_err(),
            PtreeError::MissingOption("pid_field")
        );
    }
}
