//! CLI tests for the dgov binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// dgov with config lookup and log output confined to `dir`
fn dgov(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dgov").unwrap();
    cmd.current_dir(dir.path())
        .env("XDG_DATA_HOME", dir.path().join("data"))
        .env("XDG_CONFIG_HOME", dir.path().join("config"))
        .env("HOME", dir.path())
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    dgov(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("simulate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_prints_defaults() {
    let dir = TempDir::new().unwrap();
    dgov(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max-concurrency: 2"))
        .stdout(predicate::str::contains("request-delay-ms: 1000"))
        .stdout(predicate::str::contains("api-key-env: API_KEY"));
}

#[test]
fn test_config_reads_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.yml");
    std::fs::write(&path, "governor:\n  max-concurrency: 7\n").unwrap();

    dgov(&dir)
        .args(["config", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("max-concurrency: 7"));
}

#[test]
fn test_config_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    dgov(&dir)
        .args(["config", "--config", "does-not-exist.yml"])
        .assert()
        .failure();
}

#[test]
fn test_simulate_without_failures() {
    let dir = TempDir::new().unwrap();
    dgov(&dir)
        .args([
            "simulate",
            "-n",
            "3",
            "--latency-ms",
            "1",
            "--transient-rate",
            "0",
            "--request-delay-ms",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 succeeded, 0 failed"))
        .stdout(predicate::str::contains("active=0 waiting=0"));
}

#[test]
fn test_simulate_all_fatal() {
    let dir = TempDir::new().unwrap();
    dgov(&dir)
        .args([
            "simulate",
            "-n",
            "2",
            "--latency-ms",
            "1",
            "--fatal-rate",
            "1",
            "--request-delay-ms",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 succeeded, 2 failed"))
        .stdout(predicate::str::contains("permission denied"));
}
