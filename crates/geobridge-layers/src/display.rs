//! A map display without a screen.
//!
//! [`HeadlessDisplay`] keeps the ordered layer list a map view would render and
//! hands out [`LocalFeatureView`]s that answer feature queries from the features
//! fetched when a sub-resource was first viewed.

use async_trait::async_trait;
use geobridge_core::error::{BridgeError, Result};
use geobridge_core::models::{FeatureQuery, LoadedResource, ResourceId, Session, SubResource};
use geobridge_core::ports::{
    ContentPlatform, DisplayLayer, DisplayLayerKind, FeatureView, MapDisplay,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::spatial;

#[derive(Debug, Clone)]
enum Entry {
    Resource(Arc<LoadedResource>),
    Annotation { id: String, title: String },
}

impl Entry {
    fn id(&self) -> &str {
        match self {
            Entry::Resource(resource) => resource.id().as_str(),
            Entry::Annotation { id, .. } => id,
        }
    }

    fn to_layer(&self) -> DisplayLayer {
        match self {
            Entry::Resource(resource) => DisplayLayer {
                id: resource.id().to_string(),
                title: resource.descriptor.title.clone(),
                kind: DisplayLayerKind::Resource,
            },
            Entry::Annotation { id, title } => DisplayLayer {
                id: id.clone(),
                title: title.clone(),
                kind: DisplayLayerKind::Annotation,
            },
        }
    }
}

#[derive(Default)]
struct DisplayState {
    /// Bottom first
    entries: Vec<Entry>,
    /// Keyed by sub-resource URL
    views: HashMap<String, Arc<LocalFeatureView>>,
}

/// Display that tracks layers in memory and serves feature views locally
pub struct HeadlessDisplay {
    platform: Arc<dyn ContentPlatform>,
    session: Session,
    state: Mutex<DisplayState>,
}

impl HeadlessDisplay {
    pub fn new(platform: Arc<dyn ContentPlatform>, session: Session) -> Self {
        Self { platform, session, state: Mutex::new(DisplayState::default()) }
    }

    /// Put a display-only layer on top, e.g. the sketch layer
    pub fn add_annotation(&self, id: impl Into<String>, title: impl Into<String>) {
        let id = id.into();
        let mut state = self.lock();
        if state.entries.iter().any(|e| e.id() == id) {
            return;
        }
        state.entries.push(Entry::Annotation { id, title: title.into() });
    }

    fn lock(&self) -> MutexGuard<'_, DisplayState> {
        // A poisoned lock only follows a panic elsewhere; the layer list is still usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_shown(&self, layer: &SubResource) -> bool {
        self.lock().entries.iter().any(|entry| match entry {
            Entry::Resource(resource) => resource.sub_resources.iter().any(|s| s.url == layer.url),
            Entry::Annotation { .. } => false,
        })
    }
}

#[async_trait]
impl MapDisplay for HeadlessDisplay {
    fn add_resource(&self, resource: Arc<LoadedResource>) {
        let mut state = self.lock();
        if state.entries.iter().any(|e| e.id() == resource.id().as_str()) {
            return;
        }
        tracing::debug!(
            resource = %resource.id(),
            title = %resource.descriptor.title,
            "Adding layer"
        );
        // New resources go underneath everything already shown
        state.entries.insert(0, Entry::Resource(resource));
    }

    fn remove_resource(&self, id: &ResourceId) -> bool {
        let mut state = self.lock();
        let before = state.entries.len();
        let mut dropped_urls = Vec::new();
        state.entries.retain(|entry| match entry {
            Entry::Resource(resource) if resource.id() == id => {
                dropped_urls.extend(resource.sub_resources.iter().map(|s| s.url.clone()));
                false
            }
            _ => true,
        });
        for url in dropped_urls {
            state.views.remove(&url);
        }

        let removed = state.entries.len() != before;
        if removed {
            tracing::debug!(resource = %id, "Removed layer");
        }
        removed
    }

    fn remove_layers(&self, ids: &[String]) {
        for id in ids {
            if !self.remove_resource(&ResourceId::new(id.clone())) {
                self.lock().entries.retain(|e| e.id() != id);
            }
        }
    }

    fn layers(&self) -> Vec<DisplayLayer> {
        self.lock().entries.iter().map(Entry::to_layer).collect()
    }

    async fn feature_view(&self, layer: &SubResource) -> Result<Arc<dyn FeatureView>> {
        if !self.is_shown(layer) {
            return Err(BridgeError::Validation(format!(
                "Layer '{}' is not on the display",
                layer.title
            )));
        }

        let cached = self.lock().views.get(&layer.url).cloned();
        if let Some(view) = cached {
            return Ok(view);
        }

        let collection =
            self.platform.query_features(&self.session, layer, &FeatureQuery::default()).await?;
        tracing::debug!(
            layer = %layer.title,
            features = collection.features.len(),
            "Feature view ready"
        );

        let view = Arc::new(LocalFeatureView::new(collection.features));
        let view = self.lock().views.entry(layer.url.clone()).or_insert(view).clone();
        Ok(view)
    }
}

/// Features of one layer held in memory
#[derive(Debug, Clone, Default)]
pub struct LocalFeatureView {
    features: Vec<geojson::Feature>,
}

impl LocalFeatureView {
    pub fn new(features: Vec<geojson::Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[async_trait]
impl FeatureView for LocalFeatureView {
    async fn query_features(&self, query: &FeatureQuery) -> Result<Vec<geojson::Feature>> {
        spatial::filter_features(&self.features, query)
    }
}
