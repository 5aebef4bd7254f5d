// ABOUTME: Integration tests for the slipway CLI.
// ABOUTME: Validates --help output and configuration error reporting.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn slipway_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("slipway"))
}

#[test]
fn help_shows_commands() {
    slipway_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn check_reports_missing_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();

    slipway_cmd()
        .current_dir(temp_dir.path())
        .args(["check", "--config", "nope.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn check_rejects_malformed_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("slipway.yml");
    fs::write(&config_path, "projects_dir: [this, is, not, a, path\n").unwrap();

    slipway_cmd()
        .current_dir(temp_dir.path())
        .args(["check", "--config", "slipway.yml"])
        .assert()
        .failure();
}
