//! End-to-end tests for the kyukei CLI binary.
//!
//! These tests exercise the compiled binary:
//! - Help and version output
//! - Shell completion generation
//! - Argument validation failures
//! - Daemon-less error reporting

use assert_cmd::Command;
use predicates::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

/// Builds a command with HOME pointed at a temp dir so no real state or
/// socket is touched.
fn kyukei(home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kyukei").unwrap();
    cmd.env("HOME", home.path());
    cmd
}

// ============================================================================
// Help & Version
// ============================================================================

#[test]
fn test_help_lists_subcommands() {
    let home = tempfile::tempdir().unwrap();
    kyukei(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("pause"))
        .stdout(predicate::str::contains("reset"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("break"))
        .stdout(predicate::str::contains("snooze"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    kyukei(&home)
        .assert()
        .success()
        .stdout(predicate::str::contains("休憩リマインダー"));
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    kyukei(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kyukei"));
}

// ============================================================================
// Shell Completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    kyukei(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kyukei"));
}

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    kyukei(&home)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_invalid_shell() {
    let home = tempfile::tempdir().unwrap();
    kyukei(&home)
        .args(["completions", "invalid"])
        .assert()
        .failure();
}

// ============================================================================
// Argument Validation
// ============================================================================

#[test]
fn test_unknown_command_fails() {
    let home = tempfile::tempdir().unwrap();
    kyukei(&home).arg("unknown").assert().failure();
}

#[test]
fn test_snooze_zero_minutes_rejected() {
    let home = tempfile::tempdir().unwrap();
    kyukei(&home)
        .args(["snooze", "--minutes", "0"])
        .assert()
        .failure();
}

#[test]
fn test_break_empty_task_rejected() {
    let home = tempfile::tempdir().unwrap();
    kyukei(&home)
        .args(["break", "--task", ""])
        .assert()
        .failure();
}

#[test]
fn test_config_reset_conflicts_with_values() {
    let home = tempfile::tempdir().unwrap();
    kyukei(&home)
        .args(["config", "--reset", "--work", "30"])
        .assert()
        .failure();
}

// ============================================================================
// Daemon-less Errors
// ============================================================================

#[test]
fn test_status_without_daemon_reports_error() {
    let home = tempfile::tempdir().unwrap();
    kyukei(&home)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("エラー"));
}
