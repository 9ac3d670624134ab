//! Integration tests for erl-eval
//!
//! These tests go through files on disk: gold and system outputs are written,
//! read back, scored and reported.

use erl_eval::io::{read_output_set, save_output_set};
use erl_eval::{ClusterEvaluation, ComparisonReport, EvalError, Metric, Output, OutputSet};
use std::path::Path;

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_score_files_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let gold = write(dir.path(), "gold.tab", "EL1\tE7\nEL2\tE7\nEL3\tNIL0001\nEL4\tE2\n");
    let sys_a = write(dir.path(), "exact.tab", "EL1 E7 1.0\nEL2 E7 1.0\nEL3 NIL5 1.0\nEL4 E2 1.0\n");
    let sys_b = write(dir.path(), "nil-only.tab", "EL1 NIL1\nEL2 NIL2\nEL3 NIL3\nEL4 NIL4\n");

    let gold = read_output_set(&gold).unwrap();
    let systems = vec![read_output_set(&sys_a).unwrap(), read_output_set(&sys_b).unwrap()];

    let report = ComparisonReport::evaluate(&gold, None, &systems).unwrap();
    let rows = report.rows();
    assert_eq!(rows[0].system, "exact");
    assert_eq!(rows[0].accuracy, 1.0);
    assert_eq!(rows[0].bcubed_plus.f1, 1.0);

    // Every mention in its own NIL cluster: only EL3 is right
    assert_eq!(rows[1].system, "nil-only");
    assert_eq!(rows[1].accuracy, 0.25);
    assert_eq!(rows[1].bcubed.precision, 1.0);
    assert!(rows[1].bcubed.recall < 1.0);
    assert_eq!(rows[1].bcubed_plus.precision, 0.25);

    let out = dir.path().join("report.tsv");
    report.write_to(std::fs::File::create(&out).unwrap()).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().nth(1).unwrap().starts_with("exact\t1.000\t"));
}

#[test]
fn test_focus_from_another_output_set() {
    let gold = OutputSet::new(
        "gold",
        vec![
            Output::new("m1", "E1", 1.0).unwrap(),
            Output::new("m2", "E1", 1.0).unwrap(),
            Output::new("m3", "E3", 1.0).unwrap(),
        ],
    )
    .unwrap();
    let system = OutputSet::new(
        "sys",
        vec![
            Output::new("m1", "E1", 1.0).unwrap(),
            Output::new("m2", "E2", 1.0).unwrap(),
            Output::new("m3", "E3", 1.0).unwrap(),
        ],
    )
    .unwrap();
    let focus = OutputSet::new("focus", vec![Output::new("m3", "E3", 1.0).unwrap()]).unwrap();

    let eval = ClusterEvaluation::with_focus(&system, &gold, focus.mention_ids()).unwrap();
    assert_eq!(eval.focus_len(), 1);
    assert_eq!(eval.scores(Metric::BCubed).f1, 1.0);

    let everything = ClusterEvaluation::new(&system, &gold).unwrap();
    assert!(everything.bcubed().recall < 1.0);
}

#[test]
fn test_save_and_reload_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let set = OutputSet::new(
        "run",
        vec![
            Output::new("EL9", "E1", 0.3).unwrap(),
            Output::new("EL1", "NIL2", 0.1).unwrap(),
            Output::new("EL5", "E1", 1.0).unwrap(),
        ],
    )
    .unwrap();

    let path = dir.path().join("run.tab");
    save_output_set(&set, &path).unwrap();
    let reloaded = read_output_set(&path).unwrap();

    assert_eq!(reloaded, set);
    assert_eq!(
        reloaded.mention_ids().collect::<Vec<_>>(),
        vec!["EL9", "EL1", "EL5"]
    );
}

#[test]
fn test_malformed_file_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "bad.tab", "EL1 E1 1.0\nEL2 E2 1.0\nEL3\n");

    match read_output_set(&path) {
        Err(EvalError::Parse { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected parse error, got {:?}", other),
    }
}
