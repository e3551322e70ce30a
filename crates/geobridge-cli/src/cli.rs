use clap::{Args, Parser, Subcommand};
use geobridge_core::models::DiagramKind;
use std::path::PathBuf;

/// geobridge - Portal layers and diagram migration
#[derive(Parser, Debug)]
#[command(name = "geobridge")]
#[command(
    about = "Query portal layers and migrate scenario features into diagram projects",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./geobridge.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Content platform (portal) URL
    #[arg(long, global = true, value_name = "URL")]
    pub portal_url: Option<String>,

    /// Diagram migration API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub diagram_api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and list the resources that can be shown as layers
    Layers(LayersArgs),

    /// Show resources and query their analysis layer with a geometry
    Analyze(AnalyzeArgs),

    /// Verify that a diagram project is ready for migration
    Verify(VerifyArgs),

    /// Convert scenario features and create them as diagrams
    Migrate(MigrateArgs),

    /// Show the effective configuration and where each value comes from
    Config,
}

#[derive(Parser, Debug)]
pub struct LayersArgs {
    /// Search query sent to the portal
    #[arg(long)]
    pub query: Option<String>,

    /// Maximum number of resources to list
    #[arg(long)]
    pub num: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Portal item ids to show, in activation order
    #[arg(required = true, value_name = "ID")]
    pub ids: Vec<String>,

    /// Query geometry as inline GeoJSON or a path to a GeoJSON file
    #[arg(long, value_name = "GEOJSON|FILE")]
    pub geometry: String,
}

/// Diagram project credentials; prompted for when omitted
#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Diagram project id
    #[arg(long)]
    pub project_id: Option<String>,

    /// Diagram API token
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Parser, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// GeoJSON feature collection with the scenario features
    #[arg(long, value_name = "FILE")]
    pub features: PathBuf,

    /// Create diagrams as projects or policies
    #[arg(long, default_value = "project")]
    pub kind: DiagramKind,

    /// Create requests in flight at once (overrides migration_concurrency)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Verify and show what would be created without creating anything
    #[arg(long)]
    pub dry_run: bool,
}
