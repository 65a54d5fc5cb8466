//! End-to-end scenarios over in-memory records

use ptree_core::{
    build_report, run, FieldValue, OutputMode, OutputRecord, PtreeOptions, Record, TableRow,
};
use std::collections::HashSet;

fn record(pid: i64, ppid: i64, path: &str, cmd: &str, t: i64) -> Record {
    let mut r = Record::new();
    r.insert("pid".into(), FieldValue::Integer(pid));
    r.insert("ppid".into(), FieldValue::Integer(ppid));
    r.insert("path".into(), FieldValue::from(path));
    r.insert("cmd".into(), FieldValue::from(cmd));
    r.insert("t".into(), FieldValue::Integer(t));
    r
}

fn scenario_one() -> Vec<Record> {
    vec![
        record(1, 0, "init", "init", 100),
        record(2, 1, "bash", "bash -l", 150),
    ]
}

fn options(root_pid: &str) -> PtreeOptions {
    PtreeOptions {
        time_field: Some("t".to_string()),
        root_pid: root_pid.to_string(),
        ..Default::default()
    }
}

fn tree_text(records: &[OutputRecord]) -> String {
    match records {
        [OutputRecord::Tree(tree)] => tree.tree.clone(),
        other => panic!("expected a single tree result, got {:?}", other),
    }
}

fn rows(records: Vec<OutputRecord>) -> Vec<TableRow> {
    records
        .into_iter()
        .map(|r| match r {
            OutputRecord::Row(row) => row,
            other => panic!("expected a row, got {:?}", other),
        })
        .collect()
}

#[test]
fn targeted_two_line_tree() {
    let output = run(&scenario_one(), &options("2"));
    let text = tree_text(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("1 "));
    assert!(lines[0].contains("init"));
    assert!(lines[1].starts_with("└── 2 "));
    assert!(lines[1].ends_with("bash -l"));

    match &output[0] {
        OutputRecord::Tree(tree) => {
            assert_eq!(tree.target_pid, "2");
            assert_eq!(tree.target_path, "bash");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn forest_same_shape() {
    let targeted = tree_text(&run(&scenario_one(), &options("2")));
    let output = run(&scenario_one(), &options(""));
    assert_eq!(tree_text(&output), targeted);
    match &output[0] {
        OutputRecord::Tree(tree) => {
            assert_eq!(tree.target_pid, "");
            assert_eq!(tree.target_path, "");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn forest_orphan_is_root() {
    let records = vec![record(5, 9, "orphan.exe", "orphan.exe", 10)];
    let report = build_report(&records, &options("")).unwrap();
    assert_eq!(report.blocks.len(), 1);
    assert_eq!(report.blocks[0][0].pid, "5");
    assert!(report.blocks[0][0].is_root());
}

#[test]
fn table_mode_rows() {
    let opts = PtreeOptions {
        mode: OutputMode::Table,
        ..options("2")
    };
    let rows = rows(run(&scenario_one(), &opts));
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].pid, "1");
    assert_eq!(rows[0].ppid, "0");
    assert_eq!(rows[0].depth, 0);
    assert!(rows[0].is_root);
    assert_eq!(rows[0].tree_prefix, "");

    assert_eq!(rows[1].pid, "2");
    assert_eq!(rows[1].ppid, "1");
    assert_eq!(rows[1].path, "bash");
    assert_eq!(rows[1].cmd, "bash -l");
    assert_eq!(rows[1].depth, 1);
    assert!(!rows[1].is_root);
    assert_eq!(rows[1].tree_prefix, "└── ");
    assert!(rows[1].line.starts_with("└── 2"));
    assert!(!rows[1].time.is_empty());
}

#[test]
fn truncated_command() {
    let records = vec![record(1, 0, "C:\\notepad.exe", "notepad.exe /x", 1)];
    let opts = PtreeOptions {
        truncate_cmd: Some(5),
        ..options("")
    };
    let text = tree_text(&run(&records, &opts));
    assert!(text.ends_with(" note…"));
}

#[test]
fn strict_path_mismatch_is_an_error() {
    let records = vec![record(3, 1, "C:\\evil.exe", "evil", 1)];
    let opts = PtreeOptions {
        root_path: "C:\\legit.exe".to_string(),
        ..options("3")
    };
    let output = run(&records, &opts);
    assert_eq!(output.len(), 1);
    match &output[0] {
        OutputRecord::Error(err) => {
            assert_eq!(
                err.error,
                "Target PID 3 with path C:\\legit.exe not found in events."
            );
        }
        other => panic!("expected an error, got {:?}", other),
    }
}

#[test]
fn two_cycle_terminates_in_every_mode() {
    let records = vec![
        record(10, 11, "a.exe", "a", 1),
        record(11, 10, "b.exe", "b", 2),
    ];
    for start_from_root in [true, false] {
        let opts = PtreeOptions {
            start_from_root,
            ..options("10")
        };
        let report = build_report(&records, &opts).unwrap();
        assert!(report.lines().count() <= 4);
        assert!(report.has_warnings());
    }
    // Neither process is a root in forest mode
    let report = build_report(&records, &options("")).unwrap();
    assert!(report.blocks.is_empty());
}

/// Small deterministic generator so the test needs no extra crates
fn forest_records(n: i64) -> Vec<Record> {
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed
    };
    (1..=n)
        .map(|pid| {
            // Parents always have smaller pids; some point outside the data
            let ppid = if pid == 1 || next() % 7 == 0 {
                1000 + pid
            } else {
                (next() % (pid as u64 - 1) + 1) as i64
            };
            let t = (next() % 50) as i64;
            record(pid, ppid, &format!("p{}.exe", pid), "cmd", t)
        })
        .collect()
}

#[test]
fn forest_prints_every_process_once() {
    let records = forest_records(300);
    let report = build_report(&records, &options("")).unwrap();

    let printed: Vec<&str> = report.lines().map(|l| l.pid.as_str()).collect();
    let unique: HashSet<&str> = printed.iter().copied().collect();
    assert_eq!(printed.len(), 300);
    assert_eq!(unique.len(), 300);

    let roots: HashSet<&str> = report
        .lines()
        .filter(|l| l.is_root())
        .map(|l| l.pid.as_str())
        .collect();
    let expected: HashSet<String> = (1..=300i64)
        .filter(|pid| {
            let ppid = match &records[(*pid - 1) as usize]["ppid"] {
                FieldValue::Integer(p) => *p,
                _ => unreachable!(),
            };
            ppid > 300
        })
        .map(|pid| pid.to_string())
        .collect();
    assert_eq!(roots.len(), expected.len());
    assert!(expected.iter().all(|pid| roots.contains(pid.as_str())));
}

#[test]
fn output_independent_of_input_order() {
    let mut records = forest_records(200);
    let forward = tree_text(&run(&records, &options("")));
    records.reverse();
    let backward = tree_text(&run(&records, &options("")));
    records.rotate_left(37);
    let rotated = tree_text(&run(&records, &options("")));
    assert_eq!(forward, backward);
    assert_eq!(forward, rotated);
}
