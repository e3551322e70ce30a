use super::project_credentials;
use crate::cli::VerifyArgs;
use crate::output::OutputWriter;
use crate::output_types::{ConsoleRow, VerifyOutput};
use crate::progress;
use anyhow::{Context, Result};
use geobridge_core::config::LayeredConfig;
use geobridge_migrate::{MigrationOptions, MigrationWorkflow};
use geobridge_remote::DiagramApiClient;
use std::sync::Arc;

pub async fn execute(
    args: VerifyArgs,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let (project_id, token) = project_credentials(args.project).await?;
    let workflow = diagram_workflow(config, MigrationOptions::default())?;

    let spinner = progress::spinner_for(output.is_json(), "Verifying project...");
    let verified = workflow.verify_project(&project_id, &token).await;
    match &verified {
        Ok(()) => progress::finish_success(&spinner, "Project verified"),
        Err(_) => progress::finish_error(&spinner, "Verification failed"),
    }

    let console = workflow.console().entries();
    if output.is_json() {
        output.result(VerifyOutput {
            project_id,
            state: workflow.state().to_string(),
            migration_enabled: workflow.is_migration_enabled(),
            console,
        })?;
    } else {
        output.section("Console");
        output.table(console.iter().map(ConsoleRow::from).collect());
        if workflow.is_migration_enabled() {
            output.success(format!("Project {} is ready for migration", project_id.trim()));
        }
    }

    verified.context("Project verification failed")
}

/// Migration workflow against the configured diagram API
pub(super) fn diagram_workflow(
    config: &LayeredConfig,
    options: MigrationOptions,
) -> Result<MigrationWorkflow> {
    let service = DiagramApiClient::new(&config.diagram_api_url.value, config.request_timeout())
        .context("Failed to create diagram API client")?;
    Ok(MigrationWorkflow::new(Arc::new(service), options))
}
