//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use geobridge_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

const ENV_KEYS: &[&str] = &[
    "GEOBRIDGE_PORTAL_URL",
    "GEOBRIDGE_DIAGRAM_API_URL",
    "GEOBRIDGE_PAGE_SIZE",
    "GEOBRIDGE_MIGRATION_CONCURRENCY",
    "GEOBRIDGE_PORTAL_TOKEN",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", contents).unwrap();
    file
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let file = config_file(
        r#"
portal_url = "https://file.example.org"
page_size = 20
"#,
    );

    env::set_var("GEOBRIDGE_PORTAL_URL", "https://env.example.org");

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.portal_url.value, "https://env.example.org");
    assert_eq!(config.portal_url.source, ConfigSource::Environment);
    // Not set in the environment, so the file value stays
    assert_eq!(config.page_size.value, 20);
    assert_eq!(config.page_size.source, ConfigSource::File);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_everything() {
    clear_env();
    let file = config_file(r#"diagram_api_url = "https://file.example.org/api/v1""#);
    env::set_var("GEOBRIDGE_DIAGRAM_API_URL", "https://env.example.org/api/v1");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    config.update_from_cli(CliConfigOverrides {
        diagram_api_url: Some("https://cli.example.org/api/v1".to_string()),
        ..Default::default()
    });

    assert_eq!(config.diagram_api_url.value, "https://cli.example.org/api/v1");
    assert_eq!(config.diagram_api_url.source, ConfigSource::Cli);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("GEOBRIDGE_PAGE_SIZE", "lots");
    env::set_var("GEOBRIDGE_MIGRATION_CONCURRENCY", "0");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.page_size.value, 100);
    assert_eq!(config.page_size.source, ConfigSource::Default);
    assert_eq!(config.migration_concurrency.value, 4);

    clear_env();
}

#[test]
#[serial]
fn test_portal_token_only_from_environment() {
    clear_env();
    let config = LayeredConfig::with_defaults().load_from_env();
    assert!(config.portal_token.is_none());

    env::set_var("GEOBRIDGE_PORTAL_TOKEN", "  token-123  ");
    let config = LayeredConfig::with_defaults().load_from_env();
    assert_eq!(config.portal_token.as_deref(), Some("token-123"));
    assert!(!config.to_inspection_map().contains_key("portal_token"));

    clear_env();
}

#[test]
fn test_malformed_file_is_reported() {
    let file = config_file("page_size = \"many\"");
    let result = LayeredConfig::with_defaults().load_from_file(file.path());
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Failed to parse TOML"));
}
