//! Local evaluation of feature queries against features already held by the display.

use geo::algorithm::intersects::Intersects;
use geo::Geometry as GeoGeometry;
use geobridge_core::error::{BridgeError, Result};
use geobridge_core::models::{FeatureQuery, SpatialRelationship};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Convert a GeoJSON geometry to a `geo` geometry
///
/// Returns `None` for geometries `geo` cannot represent (e.g. empty rings).
pub fn to_geo_geometry(geometry: &geojson::Geometry) -> Option<GeoGeometry<f64>> {
    GeoGeometry::<f64>::try_from(geometry.clone()).ok()
}

/// Check whether `feature` stands in `relationship` to `filter`
pub fn evaluate_relationship(
    feature: &geojson::Geometry,
    filter: &geojson::Geometry,
    relationship: SpatialRelationship,
) -> bool {
    let (Some(feature), Some(filter)) = (to_geo_geometry(feature), to_geo_geometry(filter)) else {
        return false;
    };

    match relationship {
        SpatialRelationship::Intersects => feature.intersects(&filter),
    }
}

/// Attribute filter understood by local views
#[derive(Debug, Clone, PartialEq, Eq)]
enum WhereClause {
    All,
    NotNull(String),
}

fn parse_where(clause: &str) -> Result<WhereClause> {
    let trimmed = clause.trim();
    if trimmed.is_empty() || trimmed == "1=1" {
        return Ok(WhereClause::All);
    }

    let upper = trimmed.to_ascii_uppercase();
    if let Some(field) = upper.strip_suffix(" IS NOT NULL") {
        // Field names keep their original case
        let field = &trimmed[..field.len()];
        if !field.trim().is_empty() && !field.trim().contains(char::is_whitespace) {
            return Ok(WhereClause::NotNull(field.trim().to_string()));
        }
    }

    Err(BridgeError::Validation(format!("Unsupported where clause for a local view: '{}'", clause)))
}

fn property<'a>(feature: &'a geojson::Feature, name: &str) -> Option<&'a Value> {
    feature
        .properties
        .as_ref()
        .and_then(|props| props.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)))
        .map(|(_, value)| value)
}

/// Apply `query` to an in-memory feature set
pub fn filter_features(
    features: &[geojson::Feature],
    query: &FeatureQuery,
) -> Result<Vec<geojson::Feature>> {
    let where_clause = parse_where(&query.where_clause)?;
    let select_all = query.out_fields.iter().any(|f| f == "*");

    let mut seen = HashSet::new();
    let mut matched = Vec::new();

    for feature in features {
        if let WhereClause::NotNull(field) = &where_clause {
            if matches!(property(feature, field), None | Some(Value::Null)) {
                continue;
            }
        }

        if let Some(filter) = &query.geometry {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            if !evaluate_relationship(geometry, filter, query.spatial_relationship) {
                continue;
            }
        }

        let mut selected = feature.clone();
        if !select_all {
            let props: Map<String, Value> = query
                .out_fields
                .iter()
                .filter_map(|name| property(feature, name).map(|v| (name.clone(), v.clone())))
                .collect();
            selected.properties = Some(props);
        }
        if !query.return_geometry {
            selected.geometry = None;
        }

        if query.return_distinct_values {
            let key = serde_json::to_string(&selected.properties).unwrap_or_default();
            if !seen.insert(key) {
                continue;
            }
            selected.id = None;
        }

        matched.push(selected);
    }

    Ok(matched)
}
