use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Credential, FeatureQuery, LoadedResource, PortalUser, ResourceDescriptor, ResourceQuery,
    Session, SubResource,
};

/// Port for the geospatial content platform
#[async_trait]
pub trait ContentPlatform: Send + Sync {
    /// Resolve the user a credential belongs to
    async fn current_user(&self, portal_url: &str, credential: &Credential)
        -> Result<Option<PortalUser>>;

    /// Run one bounded listing query, in the order the platform returns it
    async fn list_resources(
        &self,
        session: &Session,
        query: &ResourceQuery,
    ) -> Result<Vec<ResourceDescriptor>>;

    /// Load a resource and hydrate all of its sub-resources
    async fn load_resource(
        &self,
        session: &Session,
        descriptor: &ResourceDescriptor,
    ) -> Result<LoadedResource>;

    /// Query the features of one sub-resource
    async fn query_features(
        &self,
        session: &Session,
        layer: &SubResource,
        query: &FeatureQuery,
    ) -> Result<geojson::FeatureCollection>;
}
