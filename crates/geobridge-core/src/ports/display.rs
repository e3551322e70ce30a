use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{AnalysisSource, FeatureQuery, LoadedResource, ResourceId, SubResource};

/// Kind of a layer shown by the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayLayerKind {
    /// A loaded platform resource
    Resource,
    /// A display-only layer such as the sketch layer
    Annotation,
}

/// A layer currently on the display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayLayer {
    pub id: String,
    pub title: String,
    pub kind: DisplayLayerKind,
}

/// Port for the map display service
#[async_trait]
pub trait MapDisplay: Send + Sync {
    /// Show a loaded resource; showing one that is already shown is a no-op
    fn add_resource(&self, resource: Arc<LoadedResource>);

    /// Hide a resource, returning whether it was shown
    fn remove_resource(&self, id: &ResourceId) -> bool;

    /// Hide several layers by display id
    fn remove_layers(&self, ids: &[String]);

    /// Layers currently shown, bottom first
    fn layers(&self) -> Vec<DisplayLayer>;

    /// The feature view backing a shown sub-resource
    async fn feature_view(&self, layer: &SubResource) -> Result<Arc<dyn FeatureView>>;
}

/// Features of one layer as the display currently holds them
#[async_trait]
pub trait FeatureView: Send + Sync {
    async fn query_features(&self, query: &FeatureQuery) -> Result<Vec<geojson::Feature>>;
}

/// Receives the result of a geometry query, e.g. to open a detail panel
pub trait ResultPresenter: Send + Sync {
    fn present(&self, source: &AnalysisSource, features: &[geojson::Feature]);
}
