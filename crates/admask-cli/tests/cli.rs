//! Binary-level smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("admask")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_show_prints_defaults() {
    Command::cargo_bin("admask")
        .unwrap()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("working_resolution"))
        .stdout(predicate::str::contains("mask_ratio"));
}

#[test]
fn test_process_rejects_missing_input() {
    Command::cargo_bin("admask")
        .unwrap()
        .args(["process", "/nonexistent/card.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_config_init_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    Command::cargo_bin("admask")
        .unwrap()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("preredact_keep_ratio"));
}
