//! Plain text rendering for reports

use crate::report::Report;

/// Render the full tree block
///
/// Lines of one tree are newline-joined; consecutive trees (forest mode) are
/// separated by a single blank line.
pub fn render_tree(report: &Report) -> String {
    report
        .blocks
        .iter()
        .map(|block| {
            block
                .iter()
                .map(|line| line.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineKind, RenderedLine};

    fn line(text: &str) -> RenderedLine {
        RenderedLine {
            text: text.to_string(),
            tree_prefix: String::new(),
            pid: String::new(),
            ppid: String::new(),
            path: String::new(),
            cmd: String::new(),
            time: String::new(),
            depth: 0,
            kind: LineKind::Root,
        }
    }

    #[test]
    fn test_blank_line_between_trees() {
        let report = Report {
            target: None,
            blocks: vec![vec![line("a"), line("b")], vec![line("c")]],
            warnings: vec![],
        };
        assert_eq!(render_tree(&report), "a\nb\n\nc");
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(render_tree(&Report::default()), "");
    }
}
