use crate::error::{BridgeError, Result};
use crate::models::ResourceQuery;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "geobridge.toml";

pub const DEFAULT_PORTAL_URL: &str = "https://www.arcgis.com";
pub const DEFAULT_OAUTH_APP_ID: &str = "PZdAgiu187TroTCX";
// Placeholder endpoint until a live diagram API is configured.
pub const DEFAULT_DIAGRAM_API_URL: &str = "http://local.test:9000/api/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ANALYSIS_MARKER: &str = "interventions";
pub const DEFAULT_MIGRATION_CONCURRENCY: usize = 4;

/// Environment variable holding a portal token; never read from files
pub const ENV_PORTAL_TOKEN: &str = "GEOBRIDGE_PORTAL_TOKEN";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for geobridge
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub portal_url: ConfigValue<String>,
    pub oauth_app_id: ConfigValue<String>,
    pub diagram_api_url: ConfigValue<String>,
    pub request_timeout_secs: ConfigValue<u64>,
    pub resource_query: ConfigValue<String>,
    pub page_size: ConfigValue<u32>,
    pub analysis_marker: ConfigValue<String>,
    pub migration_concurrency: ConfigValue<usize>,
    pub portal_token: Option<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            portal_url: ConfigValue::new(DEFAULT_PORTAL_URL.to_string(), ConfigSource::Default),
            oauth_app_id: ConfigValue::new(DEFAULT_OAUTH_APP_ID.to_string(), ConfigSource::Default),
            diagram_api_url: ConfigValue::new(
                DEFAULT_DIAGRAM_API_URL.to_string(),
                ConfigSource::Default,
            ),
            request_timeout_secs: ConfigValue::new(
                DEFAULT_REQUEST_TIMEOUT_SECS,
                ConfigSource::Default,
            ),
            resource_query: ConfigValue::new(
                ResourceQuery::DEFAULT_QUERY.to_string(),
                ConfigSource::Default,
            ),
            page_size: ConfigValue::new(ResourceQuery::DEFAULT_PAGE_SIZE, ConfigSource::Default),
            analysis_marker: ConfigValue::new(
                DEFAULT_ANALYSIS_MARKER.to_string(),
                ConfigSource::Default,
            ),
            migration_concurrency: ConfigValue::new(
                DEFAULT_MIGRATION_CONCURRENCY,
                ConfigSource::Default,
            ),
            portal_token: None,
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| BridgeError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| BridgeError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(portal_url) = file_config.portal_url {
            self.portal_url.update(portal_url, ConfigSource::File);
        }

        if let Some(oauth_app_id) = file_config.oauth_app_id {
            self.oauth_app_id.update(oauth_app_id, ConfigSource::File);
        }

        if let Some(diagram_api_url) = file_config.diagram_api_url {
            self.diagram_api_url.update(diagram_api_url, ConfigSource::File);
        }

        if let Some(timeout) = file_config.request_timeout_secs {
            self.request_timeout_secs
                .update(parse_non_zero("request_timeout_secs", timeout)?, ConfigSource::File);
        }

        if let Some(resource_query) = file_config.resource_query {
            self.resource_query.update(resource_query, ConfigSource::File);
        }

        if let Some(page_size) = file_config.page_size {
            self.page_size.update(parse_non_zero("page_size", page_size)?, ConfigSource::File);
        }

        if let Some(marker) = file_config.analysis_marker {
            self.analysis_marker.update(marker, ConfigSource::File);
        }

        if let Some(concurrency) = file_config.migration_concurrency {
            self.migration_concurrency
                .update(parse_non_zero("migration_concurrency", concurrency)?, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // GEOBRIDGE_PORTAL_URL
        if let Some(url) = non_empty_var("GEOBRIDGE_PORTAL_URL") {
            self.portal_url.update(url, ConfigSource::Environment);
        }

        // GEOBRIDGE_OAUTH_APP_ID
        if let Some(app_id) = non_empty_var("GEOBRIDGE_OAUTH_APP_ID") {
            self.oauth_app_id.update(app_id, ConfigSource::Environment);
        }

        // GEOBRIDGE_DIAGRAM_API_URL
        if let Some(url) = non_empty_var("GEOBRIDGE_DIAGRAM_API_URL") {
            self.diagram_api_url.update(url, ConfigSource::Environment);
        }

        // GEOBRIDGE_REQUEST_TIMEOUT_SECS
        if let Some(raw) = non_empty_var("GEOBRIDGE_REQUEST_TIMEOUT_SECS") {
            match raw.parse::<u64>().ok().filter(|v| *v > 0) {
                Some(secs) => self.request_timeout_secs.update(secs, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid GEOBRIDGE_REQUEST_TIMEOUT_SECS value '{}': expected a positive integer",
                    raw
                ),
            }
        }

        // GEOBRIDGE_RESOURCE_QUERY
        if let Some(query) = non_empty_var("GEOBRIDGE_RESOURCE_QUERY") {
            self.resource_query.update(query, ConfigSource::Environment);
        }

        // GEOBRIDGE_PAGE_SIZE
        if let Some(raw) = non_empty_var("GEOBRIDGE_PAGE_SIZE") {
            match raw.parse::<u32>().ok().filter(|v| *v > 0) {
                Some(size) => self.page_size.update(size, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid GEOBRIDGE_PAGE_SIZE value '{}': expected a positive integer",
                    raw
                ),
            }
        }

        // GEOBRIDGE_ANALYSIS_MARKER
        if let Some(marker) = non_empty_var("GEOBRIDGE_ANALYSIS_MARKER") {
            self.analysis_marker.update(marker, ConfigSource::Environment);
        }

        // GEOBRIDGE_MIGRATION_CONCURRENCY
        if let Some(raw) = non_empty_var("GEOBRIDGE_MIGRATION_CONCURRENCY") {
            match raw.parse::<usize>().ok().filter(|v| *v > 0) {
                Some(n) => self.migration_concurrency.update(n, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid GEOBRIDGE_MIGRATION_CONCURRENCY value '{}': expected a positive integer",
                    raw
                ),
            }
        }

        // GEOBRIDGE_PORTAL_TOKEN
        self.portal_token = non_empty_var(ENV_PORTAL_TOKEN);

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(portal_url) = overrides.portal_url {
            self.portal_url.update(portal_url, ConfigSource::Cli);
        }

        if let Some(diagram_api_url) = overrides.diagram_api_url {
            self.diagram_api_url.update(diagram_api_url, ConfigSource::Cli);
        }

        if let Some(resource_query) = overrides.resource_query {
            self.resource_query.update(resource_query, ConfigSource::Cli);
        }

        if let Some(page_size) = overrides.page_size {
            self.page_size.update(page_size, ConfigSource::Cli);
        }
    }

    /// Request timeout applied to every data call
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.value)
    }

    /// The listing query built from the configured query text and page size
    pub fn resource_query(&self) -> ResourceQuery {
        ResourceQuery::new(self.resource_query.value.clone()).with_num(self.page_size.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "portal_url".to_string(),
            (self.portal_url.value.clone(), self.portal_url.source),
        );
        map.insert(
            "oauth_app_id".to_string(),
            (self.oauth_app_id.value.clone(), self.oauth_app_id.source),
        );
        map.insert(
            "diagram_api_url".to_string(),
            (self.diagram_api_url.value.clone(), self.diagram_api_url.source),
        );
        map.insert(
            "request_timeout_secs".to_string(),
            (self.request_timeout_secs.value.to_string(), self.request_timeout_secs.source),
        );
        map.insert(
            "resource_query".to_string(),
            (self.resource_query.value.clone(), self.resource_query.source),
        );
        map.insert(
            "page_size".to_string(),
            (self.page_size.value.to_string(), self.page_size.source),
        );
        map.insert(
            "analysis_marker".to_string(),
            (self.analysis_marker.value.clone(), self.analysis_marker.source),
        );
        map.insert(
            "migration_concurrency".to_string(),
            (self.migration_concurrency.value.to_string(), self.migration_concurrency.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    portal_url: Option<String>,
    oauth_app_id: Option<String>,
    diagram_api_url: Option<String>,
    request_timeout_secs: Option<u64>,
    resource_query: Option<String>,
    page_size: Option<u32>,
    analysis_marker: Option<String>,
    migration_concurrency: Option<usize>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub portal_url: Option<String>,
    pub diagram_api_url: Option<String>,
    pub resource_query: Option<String>,
    pub page_size: Option<u32>,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_non_zero<T: PartialEq + Default>(key: &str, value: T) -> Result<T> {
    if value == T::default() {
        return Err(BridgeError::ConfigInvalid {
            key: key.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
