//! In-memory platform and presenter implementations for development and testing.
//!
//! A poisoned lock still holds consistent data here, so it is recovered
//! rather than propagated. For real portals, use the HTTP adapter.

use async_trait::async_trait;
use geobridge_core::error::{BridgeError, Result};
use geobridge_core::models::{
    AnalysisSource, Credential, FeatureQuery, LoadedResource, PortalUser, ResourceDescriptor,
    ResourceId, ResourceQuery, Session, SubResource,
};
use geobridge_core::ports::{ContentPlatform, ResultPresenter};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::spatial;

/// In-memory implementation of ContentPlatform
#[derive(Debug, Clone, Default)]
pub struct MemoryPlatform {
    resources: Arc<RwLock<Vec<LoadedResource>>>,
    features: Arc<RwLock<HashMap<String, Vec<geojson::Feature>>>>,
    users: Arc<RwLock<HashMap<String, PortalUser>>>,
    loads: Arc<RwLock<HashMap<ResourceId, usize>>>,
    feature_queries: Arc<AtomicUsize>,
    load_delay: Arc<RwLock<Option<Duration>>>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource; listings return resources in insertion order
    pub fn insert_resource(&self, resource: LoadedResource) {
        self.resources.write().unwrap_or_else(PoisonError::into_inner).push(resource);
    }

    /// Set the features served for a sub-resource
    pub fn insert_features(&self, layer_url: impl Into<String>, features: Vec<geojson::Feature>) {
        self.features
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(layer_url.into(), features);
    }

    /// Accept `token` as a credential of `user`
    pub fn insert_user(&self, token: impl Into<String>, user: PortalUser) {
        self.users.write().unwrap_or_else(PoisonError::into_inner).insert(token.into(), user);
    }

    /// Delay every load, to widen the window for overlapping toggles
    pub fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.write().unwrap_or_else(PoisonError::into_inner) = Some(delay);
    }

    /// How many times `id` has been loaded
    pub fn load_count(&self, id: &ResourceId) -> usize {
        self.loads.read().unwrap_or_else(PoisonError::into_inner).get(id).copied().unwrap_or(0)
    }

    /// How many feature queries have been served
    pub fn feature_query_count(&self) -> usize {
        self.feature_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentPlatform for MemoryPlatform {
    async fn current_user(
        &self,
        _portal_url: &str,
        credential: &Credential,
    ) -> Result<Option<PortalUser>> {
        match self.users.read().unwrap_or_else(PoisonError::into_inner).get(&credential.token) {
            Some(user) => Ok(Some(user.clone())),
            None => Err(BridgeError::Authorization {
                status: 498,
                message: "Invalid token.".to_string(),
            }),
        }
    }

    async fn list_resources(
        &self,
        _session: &Session,
        query: &ResourceQuery,
    ) -> Result<Vec<ResourceDescriptor>> {
        let resources = self.resources.read().unwrap_or_else(PoisonError::into_inner);
        Ok(resources.iter().take(query.num as usize).map(|r| r.descriptor.clone()).collect())
    }

    async fn load_resource(
        &self,
        _session: &Session,
        descriptor: &ResourceDescriptor,
    ) -> Result<LoadedResource> {
        {
            let mut loads = self.loads.write().unwrap_or_else(PoisonError::into_inner);
            *loads.entry(descriptor.id.clone()).or_insert(0) += 1;
        }

        let delay = *self.load_delay.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let resources = self.resources.read().unwrap_or_else(PoisonError::into_inner);
        resources.iter().find(|r| r.id() == &descriptor.id).cloned().ok_or_else(|| {
            BridgeError::ResourceAccess {
                status: 400,
                message: format!("Item '{}' does not exist or is inaccessible.", descriptor.id),
            }
        })
    }

    async fn query_features(
        &self,
        _session: &Session,
        layer: &SubResource,
        query: &FeatureQuery,
    ) -> Result<geojson::FeatureCollection> {
        self.feature_queries.fetch_add(1, Ordering::SeqCst);

        let features = self
            .features
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&layer.url)
            .cloned()
            .unwrap_or_default();
        let features = spatial::filter_features(&features, query)?;
        Ok(geojson::FeatureCollection { bbox: None, features, foreign_members: None })
    }
}

/// Presenter that keeps every delivered result
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    presented: Arc<RwLock<Vec<(AnalysisSource, Vec<geojson::Feature>)>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> Vec<(AnalysisSource, Vec<geojson::Feature>)> {
        self.presented.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn take(&self) -> Vec<(AnalysisSource, Vec<geojson::Feature>)> {
        std::mem::take(&mut *self.presented.write().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ResultPresenter for RecordingPresenter {
    fn present(&self, source: &AnalysisSource, features: &[geojson::Feature]) {
        self.presented
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((source.clone(), features.to_vec()));
    }
}
