//! CLI argument parsing tests for Armory

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command instance with the armory binary
fn armory() -> Command {
    Command::new(env!("CARGO_BIN_EXE_armory"))
}

#[test]
fn test_help_flag() {
    let mut cmd = armory();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Tool registry, chain runner"))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--verbose"));
}

#[test]
fn test_version_flag() {
    let mut cmd = armory();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_no_args_shows_help() {
    let mut cmd = armory();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_run_requires_tool_and_input() {
    let mut cmd = armory();
    cmd.args(["run", "upper"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("INPUT"));
}

#[test]
fn test_batch_requires_task() {
    let mut cmd = armory();
    cmd.arg("batch");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--task"));
}

#[test]
fn test_unknown_subcommand() {
    let mut cmd = armory();
    cmd.arg("explode");
    cmd.assert().failure();
}
