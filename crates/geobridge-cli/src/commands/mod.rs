//! Command implementations

mod analyze;
mod config;
mod layers;
mod migrate;
mod verify;

use crate::cli::{Cli, Commands, ProjectArgs};
use crate::config_loader;
use crate::identity::PromptIdentity;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use geobridge_core::config::{CliConfigOverrides, LayeredConfig};
use geobridge_core::models::Session;
use geobridge_core::BridgeError;
use geobridge_layers::SessionManager;
use geobridge_remote::PortalClient;
use std::sync::Arc;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    let (resource_query, page_size) = match &cli.command {
        Commands::Layers(args) => (args.query.clone(), args.num),
        _ => (None, None),
    };
    let config = config_loader::load_config_with_overrides(
        cli.config.as_deref(),
        CliConfigOverrides {
            portal_url: cli.portal_url,
            diagram_api_url: cli.diagram_api_url,
            resource_query,
            page_size,
        },
    )?;

    match cli.command {
        Commands::Layers(_) => layers::execute(&config, &output).await,
        Commands::Analyze(args) => analyze::execute(args, &config, &output).await,
        Commands::Verify(args) => verify::execute(args, &config, &output).await,
        Commands::Migrate(args) => migrate::execute(args, &config, &output).await,
        Commands::Config => config::execute(&config, &output),
    }
}

/// Portal client plus the session it was signed in with
///
/// A cancelled or impossible sign-in continues anonymously.
async fn open_portal(
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<(Arc<PortalClient>, Session)> {
    let portal_url = &config.portal_url.value;
    let portal = Arc::new(
        PortalClient::new(portal_url, config.request_timeout())
            .context("Failed to create portal client")?,
    );

    let identity = Arc::new(PromptIdentity::new(
        portal_url,
        &config.oauth_app_id.value,
        config.portal_token.clone(),
    ));
    let sessions = SessionManager::new(identity, portal.clone());

    let session = match sessions.establish_session(portal_url).await {
        Ok(session) => session,
        Err(BridgeError::Authentication { reason }) => {
            output.warning(format!("Continuing without signing in: {}", reason));
            Session::anonymous(portal_url)
        }
        Err(e) => return Err(e).context("Failed to establish portal session"),
    };

    tracing::info!(user = %sessions.current_label(), portal = %portal_url, "Portal session ready");
    Ok((portal, session))
}

/// Project id and token from the arguments, prompting for what is missing
///
/// Without a terminal, missing values stay blank and verification rejects them.
async fn project_credentials(args: ProjectArgs) -> Result<(String, String)> {
    let attended = console::user_attended();

    let project_id = match args.project_id {
        Some(id) => id,
        None if attended => tokio::task::spawn_blocking(|| {
            Input::<String>::new().with_prompt("Project ID").allow_empty(true).interact_text()
        })
        .await??,
        None => String::new(),
    };

    let token = match args.token {
        Some(token) => token,
        None if attended => tokio::task::spawn_blocking(|| {
            Password::new().with_prompt("API token").allow_empty_password(true).interact()
        })
        .await??,
        None => String::new(),
    };

    Ok((project_id, token))
}
