//! End-to-end tests against the built binary.

mod common;

use common::{run_cli, single_hit_then_neutral, write_file};

const SUBSCRIPTIONS: &str = "\
variables:
  \"$me\": 0
events:
  - id: my-punishes
    kind: conversion-closed
    filter:
      participant: \"$me\"
";

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn validate_accepts_good_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "subs.yaml", SUBSCRIPTIONS);

    let output = run_cli(&["validate", path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains(": ok"));
}

#[test]
fn validate_rejects_unknown_kind_with_config_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "bad.yaml",
        "events:\n  - id: a\n    kind: conversion-closd\n",
    );

    let output = run_cli(&["validate", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("conversion-closed"), "suggestion is offered");
}

#[test]
fn validate_json_reports_each_file() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_file(dir.path(), "good.yaml", SUBSCRIPTIONS);
    let bad = write_file(dir.path(), "bad.yaml", "events:\n  - id: ''\n    kind: combo-start\n");

    let output = run_cli(&[
        "validate",
        "--format",
        "json",
        good.to_str().unwrap(),
        bad.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(2));

    let lines: Vec<serde_json::Value> = stdout(&output)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["valid"], true);
    assert_eq!(lines[1]["valid"], false);
    assert!(!lines[1]["errors"].as_array().unwrap().is_empty());
}

#[test]
fn validate_missing_file() {
    let output = run_cli(&["validate", "/nonexistent/subs.yaml"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("file not found"));
}

#[test]
fn run_writes_matching_events() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_file(dir.path(), "subs.yaml", SUBSCRIPTIONS);
    let input = write_file(
        dir.path(),
        "frames.jsonl",
        &single_hit_then_neutral(46).to_jsonl(),
    );
    let out = dir.path().join("events.jsonl");

    let output = run_cli(&[
        "--quiet",
        "run",
        "--config",
        config.to_str().unwrap(),
        "--input",
        input.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
        "--no-combos",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let written = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<serde_json::Value> = written
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    let event = &lines[0];
    assert_eq!(event["sequence"], 0);
    assert!(event["emitted_at"].is_string());
    assert_eq!(event["subscription_id"], "my-punishes");
    assert_eq!(event["kind"], "conversion-closed");
    assert_eq!(event["payload"]["record"]["end_frame"], 52);
    assert_eq!(event["payload"]["record"]["opening_type"], "neutral-win");
}

#[test]
fn run_fails_on_malformed_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_file(dir.path(), "subs.yaml", SUBSCRIPTIONS);
    let input = write_file(dir.path(), "frames.jsonl", "{\"type\": \"frame\", \"frame\": \n");

    let output = run_cli(&[
        "run",
        "--config",
        config.to_str().unwrap(),
        "--input",
        input.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("line 1"));
}

#[test]
fn run_requires_config() {
    let output = run_cli(&["run"]);
    assert!(!output.status.success());
}
