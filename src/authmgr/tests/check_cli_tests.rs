//! Diagnostic binary tests
//!
//! Runs `authmgr-check` against configuration files on disk.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn run_check(config: &Path, context: &Path, capabilities: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_authmgr-check"))
        .arg(config)
        .arg(context)
        .args(capabilities)
        .env("RUST_LOG", "error")
        .output()
        .unwrap()
}

#[test]
fn test_invalid_range_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.json", r#"{"admin_ip_ranges": ["10.0.0.0/99"]}"#);
    let context = write(dir.path(), "context.json", r#"{"remote_addr": "10.0.0.1"}"#);

    let output = run_check(&config, &context, &[]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_missing_arguments_fail() {
    let output = Command::new(env!("CARGO_BIN_EXE_authmgr-check")).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_report_for_anonymous_caller() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "config.json",
        r#"{
            "anonymous_capabilities": ["ViewStats"],
            "role_assignment": {"Editor": ["alice"]},
            "admin_ip_ranges": []
        }"#,
    );
    let context = write(dir.path(), "context.json", r#"{"remote_addr": "198.51.100.7"}"#);

    let output = run_check(&config, &context, &[]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["granted"], serde_json::json!(["ViewStats"]));
    assert_eq!(report["roles"], serde_json::json!([]));
    assert_eq!(report["decisions"].as_array().unwrap().len(), 7);
    assert_eq!(
        report["grant_sources"],
        serde_json::json!(["anonymous", "role", "trusted_network", "api_bypass"])
    );
}

#[test]
fn test_report_for_named_capabilities() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "config.json",
        r#"{"role_assignment": {"Editor": ["alice"]}, "admin_ip_ranges": []}"#,
    );
    let context = write(
        dir.path(),
        "context.json",
        r#"{"authenticated": true, "username": "Alice", "remote_addr": "198.51.100.7"}"#,
    );

    let output = run_check(&config, &context, &["EditURL", "ManagePlugins"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["roles"], serde_json::json!(["Editor"]));

    let decisions = report["decisions"].as_array().unwrap();
    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0]["capability"], "EditURL");
    assert_eq!(decisions[0]["granted"], true);
    assert_eq!(decisions[1]["capability"], "ManagePlugins");
    assert_eq!(decisions[1]["granted"], false);
}
