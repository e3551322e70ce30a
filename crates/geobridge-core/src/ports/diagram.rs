use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DiagramKind, MigrationRecord, ProjectInfo, ProjectSystem, SystemId};

/// Port for the diagram migration API
#[async_trait]
pub trait DiagramService: Send + Sync {
    /// `GET projects/{id}/`
    async fn project(&self, project_id: &str, api_token: &str) -> Result<ProjectInfo>;

    /// `GET projects/{id}/systems/`
    async fn systems(&self, project_id: &str, api_token: &str) -> Result<Vec<ProjectSystem>>;

    /// `POST projects/{id}/systems/{system}/add/{kind}/`, returning the created record
    async fn add_diagram(
        &self,
        project_id: &str,
        api_token: &str,
        system: SystemId,
        kind: DiagramKind,
        record: &MigrationRecord,
    ) -> Result<serde_json::Value>;
}
