//! Integration tests for output formatting
//!
//! These run the binary against commands that never reach the network.

use std::process::{Command, Output};
use tempfile::TempDir;

fn geobridge(dir: &TempDir, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_geobridge"));
    command.current_dir(dir.path()).args(args).env("RUST_LOG", "warn");
    for (key, _) in std::env::vars() {
        if key.starts_with("GEOBRIDGE_") {
            command.env_remove(key);
        }
    }
    command.output().expect("Failed to execute command")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

fn config_value<'a>(parsed: &'a serde_json::Value, key: &str) -> &'a serde_json::Value {
    parsed["data"]["values"]
        .as_array()
        .expect("values should be an array")
        .iter()
        .find(|entry| entry["key"] == key)
        .unwrap_or_else(|| panic!("missing config key {}", key))
}

#[test]
fn test_config_json_output_is_valid() {
    let dir = TempDir::new().unwrap();
    let output = geobridge(&dir, &["config", "--json"]);

    assert!(output.status.success(), "Command should succeed");
    let parsed = stdout_json(&output);
    assert_eq!(parsed["status"], "success");

    let portal = config_value(&parsed, "portal_url");
    assert_eq!(portal["value"], "https://www.arcgis.com");
    assert_eq!(portal["source"], "Default");
    assert_eq!(parsed["data"]["portal_token_set"], false);
}

#[test]
fn test_config_sources_follow_precedence() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("geobridge.toml"),
        "portal_url = \"https://file.example.org/portal\"\npage_size = 25\n",
    )
    .unwrap();

    let output =
        geobridge(&dir, &["config", "--json", "--portal-url", "https://cli.example.org/portal"]);

    assert!(output.status.success());
    let parsed = stdout_json(&output);

    let portal = config_value(&parsed, "portal_url");
    assert_eq!(portal["value"], "https://cli.example.org/portal");
    assert_eq!(portal["source"], "Cli");

    let page_size = config_value(&parsed, "page_size");
    assert_eq!(page_size["value"], "25");
    assert_eq!(page_size["source"], "File");
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let output = geobridge(&dir, &["config", "--config", "absent.toml"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("absent.toml"), "stderr was: {}", stderr);
}

#[test]
fn test_blank_credentials_fail_verification() {
    let dir = TempDir::new().unwrap();
    let output = geobridge(&dir, &["verify", "--project-id", " ", "--token", "", "--json"]);

    assert!(!output.status.success(), "Blank input should fail");
    let parsed = stdout_json(&output);
    assert_eq!(parsed["data"]["state"], "failed");
    assert_eq!(parsed["data"]["migration_enabled"], false);
    assert_eq!(
        parsed["data"]["console"][0]["message"],
        "Please provide a valid API Token and Project ID"
    );
    assert_eq!(parsed["data"]["console"][0]["level"], "error");
}

#[test]
fn test_migrate_reports_unreadable_features() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("scenario.geojson"), "not json").unwrap();

    let output = geobridge(
        &dir,
        &["migrate", "--project-id", "42", "--token", "t", "--features", "scenario.geojson"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cannot read scenario features"), "stderr was: {}", stderr);
}

#[test]
fn test_invalid_diagram_kind_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = geobridge(&dir, &["migrate", "--features", "x.geojson", "--kind", "plan"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("project or policy"), "stderr was: {}", stderr);
}
