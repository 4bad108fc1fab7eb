//! Black-box exercises of the `shuttle` binary via `assert_cmd`, in the same
//! style as the teacher's own CLI integration tests.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn help_mentions_the_binary_name() {
    let mut cmd = Command::cargo_bin("shuttle").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("shuttle"));
}

#[test]
fn version_flag_succeeds() {
    let mut cmd = Command::cargo_bin("shuttle").unwrap();
    cmd.arg("--version").assert().success();
}

#[test]
fn config_show_prints_embedded_defaults() {
    let mut cmd = Command::cargo_bin("shuttle").unwrap();
    cmd.arg("config")
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_scan_threads"));
}

#[test]
fn config_validate_rejects_no_scanners_enabled() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("shuttle.toml");
    std::fs::write(
        &config_path,
        r#"
[settings]
on_demand_defender = false
on_demand_clam_av = false
"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("shuttle").unwrap();
    cmd.arg("--config")
        .arg(&config_path)
        .arg("config")
        .arg("validate")
        .assert()
        .failure();
}

#[test]
fn status_reports_zero_counts_against_an_empty_log_dir() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = temp_dir.path().join("log");
    let config_path = temp_dir.path().join("shuttle.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[paths]
log = "{}"
"#,
            log_dir.display()
        ),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("shuttle").unwrap();
    cmd.arg("--config")
        .arg(&config_path)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("pending=0"));
}
