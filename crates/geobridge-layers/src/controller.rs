//! Layer cache and toggle controller.
//!
//! Each resource is loaded at most once per controller. Concurrent activations
//! of the same resource share one load, and a resource deactivated while its
//! load is still in flight is not shown when the load completes.
//!
//! The analysis source is derived from the active set. The most recently
//! activated active resource is narrowed to its first sub-resource whose
//! title contains the configured marker; a resource without sub-resources
//! leaves the source empty.

use geobridge_core::config::DEFAULT_ANALYSIS_MARKER;
use geobridge_core::error::Result;
use geobridge_core::models::{
    AnalysisSource, LoadedResource, ResourceDescriptor, ResourceId, ResourceQuery, Session,
};
use geobridge_core::ports::{ContentPlatform, DisplayLayerKind, MapDisplay};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{watch, OnceCell};

type LoadCell = Arc<OnceCell<Arc<LoadedResource>>>;

#[derive(Debug, Default)]
struct ControllerState {
    /// Resources the user wants shown, in activation order
    desired: Vec<ResourceId>,
    generation: u64,
}

/// Loads, caches and toggles platform resources on a [`MapDisplay`]
pub struct LayerController {
    platform: Arc<dyn ContentPlatform>,
    display: Arc<dyn MapDisplay>,
    session: Session,
    marker: String,
    cache: Mutex<HashMap<ResourceId, LoadCell>>,
    state: Mutex<ControllerState>,
    source: watch::Sender<Option<AnalysisSource>>,
}

impl LayerController {
    pub fn new(
        platform: Arc<dyn ContentPlatform>,
        display: Arc<dyn MapDisplay>,
        session: Session,
    ) -> Self {
        let (source, _) = watch::channel(None);
        Self {
            platform,
            display,
            session,
            marker: DEFAULT_ANALYSIS_MARKER.to_string(),
            cache: Mutex::new(HashMap::new()),
            state: Mutex::new(ControllerState::default()),
            source,
        }
    }

    /// Match analysis sub-resources by `marker` instead of the default
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Layer-capable resources matching `query`, in platform order
    ///
    /// At most `query.num` entries are returned; non-layer items are dropped.
    pub async fn list_available_resources(
        &self,
        query: &ResourceQuery,
    ) -> Result<Vec<ResourceDescriptor>> {
        let listed = self.platform.list_resources(&self.session, query).await?;
        let total = listed.len();

        let resources: Vec<ResourceDescriptor> = listed
            .into_iter()
            .filter(|r| r.is_layer)
            .take(query.num as usize)
            .collect();

        tracing::info!(listed = total, layers = resources.len(), "Listed available resources");
        Ok(resources)
    }

    /// Show or hide a resource, loading it on first activation
    pub async fn toggle_resource(
        &self,
        descriptor: &ResourceDescriptor,
        active: bool,
    ) -> Result<()> {
        if active {
            self.activate(descriptor).await
        } else {
            self.deactivate(&descriptor.id);
            Ok(())
        }
    }

    async fn activate(&self, descriptor: &ResourceDescriptor) -> Result<()> {
        {
            let mut state = self.lock_state();
            state.desired.retain(|id| id != &descriptor.id);
            state.desired.push(descriptor.id.clone());
        }

        let cell = self.cache_cell(&descriptor.id);
        let loaded = match cell.get_or_try_init(|| self.load(descriptor)).await {
            Ok(loaded) => loaded.clone(),
            Err(e) => {
                tracing::warn!(resource = %descriptor.id, error = %e, "Failed to load resource");
                self.lock_state().desired.retain(|id| id != &descriptor.id);
                self.refresh_analysis_source();
                return Err(e);
            }
        };

        {
            // The desired check and the add happen under one guard
            let state = self.lock_state();
            if !state.desired.contains(&descriptor.id) {
                tracing::debug!(resource = %descriptor.id, "Deactivated while loading, not shown");
                return Ok(());
            }
            self.display.add_resource(loaded);
        }

        self.refresh_analysis_source();
        Ok(())
    }

    fn deactivate(&self, id: &ResourceId) {
        {
            let mut state = self.lock_state();
            state.desired.retain(|desired| desired != id);
            if self.display.remove_resource(id) {
                tracing::info!(resource = %id, "Layer hidden");
            }
        }
        self.refresh_analysis_source();
    }

    async fn load(&self, descriptor: &ResourceDescriptor) -> Result<Arc<LoadedResource>> {
        tracing::info!(resource = %descriptor.id, title = %descriptor.title, "Loading resource");
        let loaded = self.platform.load_resource(&self.session, descriptor).await?;
        tracing::debug!(
            resource = %descriptor.id,
            sub_resources = loaded.sub_resources.len(),
            "Resource loaded"
        );
        Ok(Arc::new(loaded))
    }

    /// Hide every resource layer and drop the analysis source
    ///
    /// Annotation layers stay. The cache is kept, so re-activating a resource
    /// does not load it again.
    pub fn clear_all(&self) {
        let ids: Vec<String> = self
            .display
            .layers()
            .into_iter()
            .filter(|layer| layer.kind == DisplayLayerKind::Resource)
            .map(|layer| layer.id)
            .collect();

        {
            let mut state = self.lock_state();
            self.display.remove_layers(&ids);
            state.desired.clear();
        }
        self.refresh_analysis_source();
        tracing::info!(removed = ids.len(), "Cleared all layers");
    }

    /// The sub-resource spatial queries currently target
    pub fn analysis_source(&self) -> Option<AnalysisSource> {
        self.source.borrow().clone()
    }

    /// Receiver that observes every analysis source reassignment
    pub fn subscribe_analysis_source(&self) -> watch::Receiver<Option<AnalysisSource>> {
        self.source.subscribe()
    }

    /// Ids of the resources that are active, in activation order
    pub fn active_resources(&self) -> Vec<ResourceId> {
        let state = self.lock_state();
        let cache = self.lock_cache();
        state
            .desired
            .iter()
            .filter(|id| cache.get(*id).is_some_and(|cell| cell.initialized()))
            .cloned()
            .collect()
    }

    /// Number of resources loaded so far
    pub fn cached_count(&self) -> usize {
        self.lock_cache().values().filter(|cell| cell.initialized()).count()
    }

    fn cache_cell(&self, id: &ResourceId) -> LoadCell {
        self.lock_cache().entry(id.clone()).or_default().clone()
    }

    fn refresh_analysis_source(&self) {
        let mut state = self.lock_state();

        let latest = {
            let cache = self.lock_cache();
            state
                .desired
                .iter()
                .rev()
                .find_map(|id| cache.get(id).and_then(|cell| cell.get()).cloned())
        };

        let target = latest.and_then(|resource| {
            if !resource.has_sub_resources() {
                return None;
            }
            match resource.find_sub_resource(&self.marker) {
                Some(sub) => Some((resource.id().clone(), sub.clone())),
                None => {
                    tracing::warn!(
                        resource = %resource.id(),
                        marker = %self.marker,
                        "No sub-resource matches the analysis marker"
                    );
                    None
                }
            }
        });

        let current = self
            .source
            .borrow()
            .as_ref()
            .map(|s| (s.resource.clone(), s.sub_resource.clone()));
        if current == target {
            return;
        }

        state.generation += 1;
        let next = target.map(|(resource, sub_resource)| AnalysisSource {
            resource,
            sub_resource,
            generation: state.generation,
        });

        match &next {
            Some(source) => tracing::info!(
                resource = %source.resource,
                layer = %source.sub_resource.title,
                generation = source.generation,
                "Analysis source set"
            ),
            None => tracing::info!(generation = state.generation, "Analysis source cleared"),
        }
        self.source.send_replace(next);
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<ResourceId, LoadCell>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
