//! geobridge CLI - Command-line interface
//!
//! Signs in to the content platform, queries its layers, and migrates
//! scenario features into a diagram project.

mod cli;
mod commands;
mod config_loader;
mod errors;
mod geometry_input;
mod identity;
mod output;
mod output_types;
mod progress;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use output::OutputWriter;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Create async runtime
    let runtime = tokio::runtime::Runtime::new()?;

    // Execute the command
    let json = cli.json;
    if let Err(error) = runtime.block_on(commands::execute(cli)) {
        let error = errors::from_anyhow(error);
        if json {
            OutputWriter::new(true).error(&error);
        } else {
            error.display();
        }
        std::process::exit(1);
    }

    Ok(())
}
