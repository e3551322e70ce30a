use super::open_portal;
use crate::output::OutputWriter;
use crate::output_types::{LayersOutput, ResourceRow};
use crate::progress;
use anyhow::{Context, Result};
use geobridge_core::config::LayeredConfig;
use geobridge_layers::{HeadlessDisplay, LayerController};
use std::sync::Arc;

pub async fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let (portal, session) = open_portal(config, output).await?;
    let display = Arc::new(HeadlessDisplay::new(portal.clone(), session.clone()));
    let controller = LayerController::new(portal, display, session);

    let query = config.resource_query();
    let spinner = progress::spinner_for(output.is_json(), "Searching portal...");
    let resources = match controller.list_available_resources(&query).await {
        Ok(resources) => {
            spinner.finish_and_clear();
            resources
        }
        Err(e) => {
            progress::finish_error(&spinner, "Search failed");
            return Err(e).context("Failed to list portal resources");
        }
    };

    let user = controller.session().user_label();
    if output.is_json() {
        output.result(LayersOutput { user, query: query.query, resources })?;
        return Ok(());
    }

    output.kv("User", &user);
    output.kv("Query", &query.query);
    output.section(format!("Resources ({})", resources.len()));
    output.table(resources.iter().map(ResourceRow::from).collect());
    Ok(())
}
