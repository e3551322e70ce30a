//! Geometry-triggered queries against the current analysis source.

use geobridge_core::error::Result;
use geobridge_core::models::{AnalysisSource, DrawnGeometry, FeatureQuery, Session};
use geobridge_core::ports::{ContentPlatform, MapDisplay, ResultPresenter};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// What happened to one drawn geometry
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// No analysis source was set; nothing was queried
    NoSource,
    /// Results were handed to the presenter
    Presented { source: AnalysisSource, count: usize },
    /// The source changed while the query ran; results were discarded
    Stale { generation: u64 },
}

/// Runs an intersect query for every completed sketch and presents the matches
pub struct QueryWorkflow {
    display: Arc<dyn MapDisplay>,
    presenter: Arc<dyn ResultPresenter>,
    source: watch::Receiver<Option<AnalysisSource>>,
}

impl QueryWorkflow {
    pub fn new(
        display: Arc<dyn MapDisplay>,
        presenter: Arc<dyn ResultPresenter>,
        source: watch::Receiver<Option<AnalysisSource>>,
    ) -> Self {
        Self { display, presenter, source }
    }

    /// Query the analysis source with one drawn geometry
    pub async fn handle_geometry(&self, drawn: DrawnGeometry) -> Result<QueryOutcome> {
        let current_source = self.source.borrow().clone();
        let Some(source) = current_source else {
            tracing::debug!("Geometry drawn without an analysis source, ignoring");
            return Ok(QueryOutcome::NoSource);
        };

        let view = self.display.feature_view(&source.sub_resource).await?;
        let features = view.query_features(&FeatureQuery::intersecting(drawn.geometry)).await?;

        let current = self.source.borrow().as_ref().map(|s| s.generation);
        if current != Some(source.generation) {
            tracing::debug!(
                generation = source.generation,
                "Analysis source changed during query, discarding results"
            );
            return Ok(QueryOutcome::Stale { generation: source.generation });
        }

        tracing::info!(
            layer = %source.sub_resource.title,
            matches = features.len(),
            "Geometry query complete"
        );
        self.presenter.present(&source, &features);
        Ok(QueryOutcome::Presented { count: features.len(), source })
    }

    /// Handle geometries until the sending side closes
    ///
    /// Failed queries are logged and do not stop the loop.
    pub async fn run(&self, mut geometries: mpsc::Receiver<DrawnGeometry>) {
        while let Some(drawn) = geometries.recv().await {
            if let Err(e) = self.handle_geometry(drawn).await {
                tracing::warn!(error = %e, "Geometry query failed");
            }
        }
        tracing::debug!("Geometry channel closed");
    }
}

/// Distinct intervention rows of the analysis source, queried on the platform
pub async fn summarize_interventions(
    platform: &dyn ContentPlatform,
    session: &Session,
    source: &AnalysisSource,
) -> Result<Vec<geojson::Feature>> {
    let collection = platform
        .query_features(session, &source.sub_resource, &FeatureQuery::intervention_summary())
        .await?;

    for row in &collection.features {
        tracing::info!(
            scenario = ?row.property("Geodesign_ScenarioID"),
            intervention = ?row.property("Intervention_type"),
            "Intervention"
        );
    }
    Ok(collection.features)
}
