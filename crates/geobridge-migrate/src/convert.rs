//! Conversion of scenario features into create-diagram records.

use geobridge_core::models::{geometry_type_name, MigrationRecord, SourceFeatureRecord};

/// Feature type token the diagram API expects for a GeoJSON geometry type
///
/// Every token is lowercased; `LineString` becomes `polyline`.
pub fn normalize_feature_type(geometry_type: &str) -> String {
    let lowered = geometry_type.trim().to_lowercase();
    match lowered.as_str() {
        "linestring" => "polyline".to_string(),
        _ => lowered,
    }
}

/// Wrap a bare geometry in a single feature with empty properties
pub fn wrap_geometry(geometry: geojson::Geometry) -> geojson::Feature {
    geojson::Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(serde_json::Map::new()),
        foreign_members: None,
    }
}

/// Create-diagram body for `source`, or `None` when it has no geometry
pub fn to_migration_record(source: &SourceFeatureRecord) -> Option<MigrationRecord> {
    let geometry = source.geometry.clone()?;
    Some(MigrationRecord {
        featuretype: normalize_feature_type(geometry_type_name(&geometry.value)),
        description: source.intervention.clone().unwrap_or_default(),
        geometry: wrap_geometry(geometry),
    })
}
