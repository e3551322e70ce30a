use super::open_portal;
use crate::cli::AnalyzeArgs;
use crate::geometry_input::parse_geometry;
use crate::output::OutputWriter;
use crate::output_types::{AnalyzeOutput, FeatureRow};
use crate::progress;
use anyhow::{Context, Result};
use geobridge_core::config::LayeredConfig;
use geobridge_core::models::{geometry_type_name, ResourceDescriptor};
use geobridge_layers::{
    summarize_interventions, HeadlessDisplay, LayerController, QueryOutcome, QueryWorkflow,
    RecordingPresenter,
};
use std::sync::Arc;

const MAX_ATTRIBUTES_WIDTH: usize = 80;

pub async fn execute(
    args: AnalyzeArgs,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let drawn = parse_geometry(&args.geometry)?;
    let (portal, session) = open_portal(config, output).await?;

    let display = Arc::new(HeadlessDisplay::new(portal.clone(), session.clone()));
    let controller = LayerController::new(portal.clone(), display.clone(), session.clone())
        .with_marker(config.analysis_marker.value.clone());
    let presenter = Arc::new(RecordingPresenter::new());
    let workflow =
        QueryWorkflow::new(display, presenter.clone(), controller.subscribe_analysis_source());

    let spinner = progress::spinner_for(output.is_json(), "Loading resources...");
    for id in &args.ids {
        spinner.set_message(format!("Loading {}...", id));
        // The portal resolves the full descriptor from the id
        let descriptor = ResourceDescriptor::new(id.clone(), id.clone(), "");
        if let Err(e) = controller.toggle_resource(&descriptor, true).await {
            progress::finish_error(&spinner, &format!("Failed to load {}", id));
            return Err(e).with_context(|| format!("Failed to load resource {}", id));
        }
    }
    progress::finish_success(&spinner, &format!("Showing {} resource(s)", args.ids.len()));

    let source = controller.analysis_source();
    let interventions: Vec<serde_json::Map<String, serde_json::Value>> = match &source {
        Some(source) => match summarize_interventions(portal.as_ref(), &session, source).await {
            Ok(rows) => rows.into_iter().filter_map(|row| row.properties).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Intervention summary failed");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let outcome = workflow.handle_geometry(drawn).await.context("Geometry query failed")?;
    let features: Vec<geojson::Feature> = match outcome {
        QueryOutcome::Presented { .. } => {
            presenter.take().into_iter().flat_map(|(_, features)| features).collect()
        }
        QueryOutcome::NoSource => {
            output.warning(format!(
                "No shown resource has a layer matching '{}', nothing was queried",
                config.analysis_marker.value
            ));
            Vec::new()
        }
        QueryOutcome::Stale { generation } => {
            tracing::debug!(generation, "Query result discarded");
            Vec::new()
        }
    };

    let active: Vec<String> =
        controller.active_resources().into_iter().map(|id| id.to_string()).collect();

    if output.is_json() {
        output.result(AnalyzeOutput {
            user: session.user_label(),
            active,
            source,
            interventions,
            features,
        })?;
        return Ok(());
    }

    output.kv("User", session.user_label());
    output.kv("Active", active.join(", "));
    if let Some(source) = &source {
        output.kv("Analysis layer", format!("{} ({})", source.sub_resource.title, source.resource));
        output.kv("Interventions", interventions.len());
    }

    output.section(format!("Intersecting features ({})", features.len()));
    let rows = features
        .iter()
        .enumerate()
        .map(|(i, feature)| FeatureRow {
            index: i + 1,
            geometry: feature
                .geometry
                .as_ref()
                .map(|g| geometry_type_name(&g.value).to_string())
                .unwrap_or_else(|| "-".to_string()),
            attributes: attributes_summary(feature),
        })
        .collect();
    output.table(rows);
    Ok(())
}

fn attributes_summary(feature: &geojson::Feature) -> String {
    let Some(properties) = &feature.properties else {
        return String::new();
    };

    let joined = properties
        .iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => format!("{}={}", key, s),
            other => format!("{}={}", key, other),
        })
        .collect::<Vec<_>>()
        .join(", ");

    if joined.chars().count() > MAX_ATTRIBUTES_WIDTH {
        let mut truncated: String = joined.chars().take(MAX_ATTRIBUTES_WIDTH - 3).collect();
        truncated.push_str("...");
        truncated
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attributes_summary_truncates() {
        let feature: geojson::Feature = serde_json::from_value(json!({
            "type": "Feature",
            "properties": { "Intervention_type": "Solar farm", "area": 12 },
            "geometry": null
        }))
        .unwrap();
        assert_eq!(attributes_summary(&feature), "Intervention_type=Solar farm, area=12");

        let long: geojson::Feature = serde_json::from_value(json!({
            "type": "Feature",
            "properties": { "notes": "x".repeat(200) },
            "geometry": null
        }))
        .unwrap();
        let summary = attributes_summary(&long);
        assert_eq!(summary.chars().count(), MAX_ATTRIBUTES_WIDTH);
        assert!(summary.ends_with("..."));
    }
}
