//! Integration tests for the testchain binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn testchain(project: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("testchain"));
    cmd.current_dir(project.path());
    for var in [
        "TESTCHAIN_POLL_INTERVAL_MS",
        "TESTCHAIN_WAIT_TIMEOUT_SECS",
        "TESTCHAIN_STEP_DEADLINE_MS",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn fast_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(".testchain.yml"),
        "barrier:\n  poll_interval_ms: 5\n  wait_timeout_secs: 10\n",
    )
    .unwrap();
    temp
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    testchain(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("order"))
        .stdout(predicate::str::contains("demo"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    testchain(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn order_steps_default_to_front() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    testchain(&temp)
        .args(["order", "--items", "a=2,b,c=1"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)1\. b.*2\. c.*3\. a")?);
    Ok(())
}

#[test]
fn order_groups_default_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    testchain(&temp)
        .args(["order", "--groups", "--items", "a=2,b,c=1"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)1\. c.*2\. a.*3\. b")?);
    Ok(())
}

#[test]
fn order_json_output() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let output = testchain(&temp)
        .args(["order", "--json", "--items", "late=9,early=1"])
        .output()?;
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value[0]["name"], "early");
    assert_eq!(value[1]["effective_priority"], 9);
    Ok(())
}

#[test]
fn order_policy_follows_config() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join(".testchain.yml"), "ordering:\n  steps: end\n")?;
    testchain(&temp)
        .args(["order", "--items", "untagged,tagged=3"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)1\. tagged.*2\. untagged")?);
    Ok(())
}

#[test]
fn order_rejects_bad_priority() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    testchain(&temp)
        .args(["order", "--items", "a=high"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid priority"));
    Ok(())
}

#[test]
fn demo_flow_reports_failure_and_skip() -> Result<(), Box<dyn std::error::Error>> {
    let temp = fast_project();
    testchain(&temp)
        .args(["demo", "flow"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("#03 | Main | Not implemented"))
        .stdout(predicate::str::contains("2 completed, 1 failed, 1 skipped"));
    Ok(())
}

#[test]
fn demo_collections_succeeds() -> Result<(), Box<dyn std::error::Error>> {
    let temp = fast_project();
    testchain(&temp)
        .args(["demo", "collections"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Consumer / Consume"))
        .stdout(predicate::str::contains("3 completed, 0 failed, 0 skipped"));
    Ok(())
}

#[test]
fn demo_skip_reports_missing_output() -> Result<(), Box<dyn std::error::Error>> {
    let temp = fast_project();
    testchain(&temp)
        .args(["demo", "skip"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Chain output \"Token\" is missing or invalid"))
        .stdout(predicate::str::contains("nothing to clean up"));
    Ok(())
}

#[test]
fn demo_step_deadline_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let temp = fast_project();
    testchain(&temp)
        .env("TESTCHAIN_STEP_DEADLINE_MS", "1")
        .args(["demo", "flow"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("timed out"));
    Ok(())
}

#[test]
fn config_shows_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    testchain(&temp)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("defaults"))
        .stdout(predicate::str::contains("wait_timeout_secs: 360"));
    Ok(())
}

#[test]
fn config_explicit_path() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let path = temp.path().join("chain.yml");
    fs::write(&path, "barrier:\n  wait_timeout_secs: 42\n")?;
    testchain(&temp)
        .args(["config", "--json", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"wait_timeout_secs\": 42"));
    Ok(())
}

#[test]
fn invalid_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join(".testchain.yml"), "barrier:\n  poll_interval_ms: [1]\n")?;
    testchain(&temp)
        .arg("config")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config"));
    Ok(())
}
