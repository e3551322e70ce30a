use super::project_credentials;
use super::verify::diagram_workflow;
use crate::cli::MigrateArgs;
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::{ConsoleRow, MigrateOutput};
use crate::progress;
use anyhow::{Context, Result};
use geobridge_core::config::LayeredConfig;
use geobridge_core::models::SourceFeatureRecord;
use geobridge_migrate::{ConsoleEntry, MigrationOptions, RecordOutcome};
use indicatif::ProgressBar;
use std::path::Path;

pub async fn execute(
    args: MigrateArgs,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let records = read_features(&args.features)?;
    tracing::info!(
        path = %args.features.display(),
        records = records.len(),
        "Read scenario features"
    );

    let (project_id, token) = project_credentials(args.project).await?;
    let options = MigrationOptions {
        kind: args.kind,
        concurrency: args.concurrency.unwrap_or(config.migration_concurrency.value),
    };
    let workflow = diagram_workflow(config, options)?;

    let spinner = progress::spinner_for(output.is_json(), "Verifying project...");
    if let Err(e) = workflow.verify_project(&project_id, &token).await {
        progress::finish_error(&spinner, "Verification failed");
        print_console(output, &workflow.console().entries());
        return Err(e).context("Project verification failed");
    }
    progress::finish_success(&spinner, "Project verified");

    if args.dry_run {
        let plan = workflow.plan(&records, &project_id)?;
        if output.is_json() {
            output.result(MigrateOutput {
                project_id,
                kind: options.kind.as_str().to_string(),
                dry_run: true,
                plan: Some(plan),
                report: None,
                console: workflow.console().entries(),
            })?;
        } else {
            output.info(format!(
                "Dry run: {} record(s) would be created as {}, {} skipped",
                plan.submissions.len(),
                options.kind.as_str(),
                plan.skipped.len()
            ));
            for skipped in &plan.skipped {
                output.kv(format!("Record {}", skipped.index + 1), skipped.error());
            }
        }
        return Ok(());
    }

    let bar = if output.is_json() {
        ProgressBar::hidden()
    } else {
        progress::create_progress_bar(records.len() as u64, "Creating diagrams")
    };
    let report = workflow
        .migrate_diagrams_with(&records, &project_id, &token, |outcome| {
            if let RecordOutcome::Failed(failed) = outcome {
                bar.println(format!("✗ Record {}: {}", failed.index + 1, failed.message));
            }
            bar.inc(1);
        })
        .await;

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            progress::finish_error(&bar, "Migration did not start");
            print_console(output, &workflow.console().entries());
            return Err(e).context("Migration failed");
        }
    };

    let summary = format!(
        "{} of {} created, {} skipped, {} failed",
        report.submitted,
        report.total,
        report.skipped.len(),
        report.failed.len()
    );
    if report.failed.is_empty() {
        progress::finish_success(&bar, &summary);
    } else {
        progress::finish_error(&bar, &summary);
    }

    let failed = report.failed.len();
    if output.is_json() {
        output.result(MigrateOutput {
            project_id,
            kind: options.kind.as_str().to_string(),
            dry_run: false,
            plan: None,
            report: Some(report),
            console: workflow.console().entries(),
        })?;
    } else {
        print_console(output, &workflow.console().entries());
    }

    anyhow::ensure!(failed == 0, "{} record(s) could not be created", failed);
    Ok(())
}

fn read_features(path: &Path) -> Result<Vec<SourceFeatureRecord>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| errors::features_unreadable(path, &e.to_string()))?;
    let collection: geojson::FeatureCollection = serde_json::from_str(&text)
        .map_err(|e| errors::features_unreadable(path, &e.to_string()))?;

    Ok(SourceFeatureRecord::from_collection(&collection))
}

fn print_console(output: &OutputWriter, entries: &[ConsoleEntry]) {
    if output.is_json() {
        return;
    }
    output.section("Console");
    output.table(entries.iter().map(ConsoleRow::from).collect());
}
