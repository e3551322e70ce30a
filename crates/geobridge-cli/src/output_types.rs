use geobridge_core::models::{AnalysisSource, ResourceDescriptor};
use geobridge_migrate::{ConsoleEntry, MigrationPlan, MigrationReport};
use serde::Serialize;
use tabled::Tabled;

/// Output for layers command
#[derive(Debug, Serialize)]
pub struct LayersOutput {
    pub user: String,
    pub query: String,
    pub resources: Vec<ResourceDescriptor>,
}

#[derive(Debug, Tabled)]
pub struct ResourceRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Description")]
    pub description: String,
}

impl From<&ResourceDescriptor> for ResourceRow {
    fn from(descriptor: &ResourceDescriptor) -> Self {
        Self {
            id: descriptor.id.to_string(),
            title: descriptor.title.clone(),
            description: descriptor.list_description(),
        }
    }
}

/// Output for analyze command
#[derive(Debug, Serialize)]
pub struct AnalyzeOutput {
    pub user: String,
    pub active: Vec<String>,
    pub source: Option<AnalysisSource>,
    pub interventions: Vec<serde_json::Map<String, serde_json::Value>>,
    pub features: Vec<geojson::Feature>,
}

#[derive(Debug, Tabled)]
pub struct FeatureRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Geometry")]
    pub geometry: String,
    #[tabled(rename = "Attributes")]
    pub attributes: String,
}

#[derive(Debug, Tabled)]
pub struct ConsoleRow {
    #[tabled(rename = "Time")]
    pub time: String,
    #[tabled(rename = "Level")]
    pub level: String,
    #[tabled(rename = "Message")]
    pub message: String,
}

impl From<&ConsoleEntry> for ConsoleRow {
    fn from(entry: &ConsoleEntry) -> Self {
        Self {
            time: entry.timestamp.format("%H:%M:%S").to_string(),
            level: format!("{:?}", entry.level).to_lowercase(),
            message: entry.message.clone(),
        }
    }
}

/// Output for verify command
#[derive(Debug, Serialize)]
pub struct VerifyOutput {
    pub project_id: String,
    pub state: String,
    pub migration_enabled: bool,
    pub console: Vec<ConsoleEntry>,
}

/// Output for migrate command
#[derive(Debug, Serialize)]
pub struct MigrateOutput {
    pub project_id: String,
    pub kind: String,
    pub dry_run: bool,
    pub plan: Option<MigrationPlan>,
    pub report: Option<MigrationReport>,
    pub console: Vec<ConsoleEntry>,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub values: Vec<ConfigEntry>,
    pub portal_token_set: bool,
}

#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
