//! Integration tests for argument parsing and the command surface.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn faultline() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("faultline"));
    cmd.env("NO_COLOR", "1")
        .env_remove("FAULTLINE_ORG")
        .env_remove("FAULTLINE_SPACE")
        .env_remove("FAULTLINE_CONFIG");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help() {
    faultline().assert().code(2).stderr(predicate::str::contains(
        "Discover Cloud Foundry applications and inject network faults",
    ));
}

#[test]
fn test_cli_help_lists_fault_commands() {
    let assert = faultline().arg("--help").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    for cmd in [
        "discover",
        "block",
        "unblock",
        "block-services",
        "unblock-services",
        "manipulate",
        "shape",
        "unmanipulate",
        "kill-monit",
        "start-monit",
        "crash",
        "routes",
        "undo",
    ] {
        assert!(out.contains(cmd), "help is missing `{cmd}`:\n{out}");
    }
}

#[test]
fn test_cli_version_flag_shows_version() {
    faultline()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("faultline"));
}

#[test]
fn test_version_command_needs_no_config() {
    faultline()
        .args(["version", "--config", "/nonexistent/config.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("faultline 0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let assert = faultline().args(["version", "--json"]).assert().success();
    let value: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid JSON");
    assert_eq!(value["version"], "0.1.0");
}

// --- Argument validation ---

#[test]
fn test_block_requires_org() {
    faultline()
        .args(["block", "--space", "staging", "--app", "billing"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--org"));
}

#[test]
fn test_block_rejects_unknown_direction() {
    faultline()
        .args(["block", "-o", "dev", "-s", "staging", "-a", "billing", "-d", "sideways"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown traffic direction"));
}

#[test]
fn test_block_rejects_malformed_port_list() {
    faultline()
        .args(["block", "-o", "dev", "-s", "staging", "-a", "billing", "-p", "80,http"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid port 'http'"));
}

#[test]
fn test_crash_rejects_non_numeric_count() {
    faultline()
        .args(["crash", "-o", "dev", "-s", "staging", "-a", "billing", "--count", "many"])
        .assert()
        .code(2);
}

#[test]
fn test_org_and_space_can_come_from_env() {
    // Parsing succeeds, so the failure is the missing configuration file.
    faultline()
        .env("FAULTLINE_ORG", "dev")
        .env("FAULTLINE_SPACE", "staging")
        .env("FAULTLINE_CONFIG", "/nonexistent/config.yaml")
        .args(["discover", "--app", "billing"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read /nonexistent/config.yaml"));
}

#[test]
fn test_latency_deviation_requires_latency() {
    faultline()
        .args(["manipulate", "-o", "dev", "-s", "staging", "-a", "billing", "--latency-sd", "5"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--latency"));
}

#[test]
fn test_manipulate_rejects_loss_out_of_range() {
    for bad in ["-5", "150", "NaN", "inf"] {
        let flag = format!("--loss={bad}");
        faultline()
            .args(["manipulate", "-o", "dev", "-s", "staging", "-a", "billing", &flag])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("between 0 and 100"));
    }
}

#[test]
fn test_manipulate_rejects_negative_corruption() {
    faultline()
        .args(["manipulate", "-o", "dev", "-s", "staging", "-a", "billing", "--corruption=-1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("between 0 and 100"));
}

#[test]
fn test_shape_rejects_zero_rate() {
    faultline()
        .args(["shape", "-o", "dev", "-s", "staging", "-a", "billing", "--download", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--download"));
}
