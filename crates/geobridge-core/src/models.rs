pub mod diagram;
pub mod geometry;
pub mod resource;
pub mod session;

pub use diagram::{
    DiagramKind, MigrationRecord, ProjectInfo, ProjectSystem, SourceFeatureRecord, SystemId,
};
pub use geometry::{geometry_type_name, DrawnGeometry, FeatureQuery, SpatialRelationship};
pub use resource::{
    AnalysisSource, LoadedResource, ResourceDescriptor, ResourceHandle, ResourceId, ResourceQuery,
    SortOrder, SubResource,
};
pub use session::{Credential, PortalUser, Session};
