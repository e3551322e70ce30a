//! Adapter for the diagram migration API.

use async_trait::async_trait;
use geobridge_core::error::Result;
use geobridge_core::models::{DiagramKind, MigrationRecord, ProjectInfo, ProjectSystem, SystemId};
use geobridge_core::ports::DiagramService;
use std::time::Duration;

use crate::client::{ClientConfig, RemoteClient, RequestOptions, StatusMessages};

pub const UNAUTHORIZED_MESSAGE: &str = "Problem with your API token, please verify by going to \
    https://www.geodesignhub.com/api/token/";
pub const BAD_REQUEST_MESSAGE: &str =
    "Please verify the Project ID, it does not exist or you dont have access to it";

/// HTTP implementation of [`DiagramService`]
#[derive(Debug, Clone)]
pub struct DiagramApiClient {
    client: RemoteClient,
}

impl DiagramApiClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let config = ClientConfig::new(api_url, timeout).with_messages(StatusMessages {
            unauthorized: UNAUTHORIZED_MESSAGE.to_string(),
            bad_request: BAD_REQUEST_MESSAGE.to_string(),
        });
        Ok(Self { client: RemoteClient::new(config)? })
    }

    pub fn api_url(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait]
impl DiagramService for DiagramApiClient {
    async fn project(&self, project_id: &str, api_token: &str) -> Result<ProjectInfo> {
        let url = self.client.segment_endpoint(&["projects", project_id])?;
        self.client.get_json(&url, RequestOptions::new().token_auth(api_token)).await
    }

    async fn systems(&self, project_id: &str, api_token: &str) -> Result<Vec<ProjectSystem>> {
        let url = self.client.segment_endpoint(&["projects", project_id, "systems"])?;
        self.client.get_json(&url, RequestOptions::new().token_auth(api_token)).await
    }

    async fn add_diagram(
        &self,
        project_id: &str,
        api_token: &str,
        system: SystemId,
        kind: DiagramKind,
        record: &MigrationRecord,
    ) -> Result<serde_json::Value> {
        let system = system.to_string();
        let url = self.client.segment_endpoint(&[
            "projects",
            project_id,
            "systems",
            &system,
            "add",
            kind.as_str(),
        ])?;
        self.client.post_json(&url, record, RequestOptions::new().token_auth(api_token)).await
    }
}
