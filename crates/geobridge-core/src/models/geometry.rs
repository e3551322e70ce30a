//! Geometry-facing types: sketched areas and the queries they drive.

use serde::{Deserialize, Serialize};

/// GeoJSON type name of a geometry value ("Point", "LineString", ...)
pub fn geometry_type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Geometry produced by one completed sketch interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnGeometry {
    pub geometry: geojson::Geometry,
}

impl DrawnGeometry {
    pub fn new(geometry: geojson::Geometry) -> Self {
        Self { geometry }
    }

    /// Axis-aligned rectangle, as the rectangle sketch tool produces
    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        let ring = vec![
            vec![min_x, min_y],
            vec![max_x, min_y],
            vec![max_x, max_y],
            vec![min_x, max_y],
            vec![min_x, min_y],
        ];
        Self::new(geojson::Geometry::new(geojson::Value::Polygon(vec![ring])))
    }
}

/// Spatial relationship between a feature and the query geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpatialRelationship {
    #[default]
    Intersects,
}

impl SpatialRelationship {
    /// Name used by the feature service query endpoint
    pub fn as_esri(&self) -> &'static str {
        match self {
            SpatialRelationship::Intersects => "esriSpatialRelIntersects",
        }
    }
}

/// A feature query against one queryable layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureQuery {
    pub where_clause: String,
    pub geometry: Option<geojson::Geometry>,
    pub spatial_relationship: SpatialRelationship,
    pub out_fields: Vec<String>,
    pub return_geometry: bool,
    pub return_distinct_values: bool,
}

impl Default for FeatureQuery {
    fn default() -> Self {
        Self {
            where_clause: "1=1".to_string(),
            geometry: None,
            spatial_relationship: SpatialRelationship::Intersects,
            out_fields: vec!["*".to_string()],
            return_geometry: true,
            return_distinct_values: false,
        }
    }
}

impl FeatureQuery {
    /// Every feature that intersects `geometry`
    pub fn intersecting(geometry: geojson::Geometry) -> Self {
        Self { geometry: Some(geometry), ..Default::default() }
    }

    /// Distinct intervention rows of a scenario layer, without geometry
    pub fn intervention_summary() -> Self {
        Self {
            where_clause: "Intervention_type IS NOT NULL".to_string(),
            geometry: None,
            spatial_relationship: SpatialRelationship::Intersects,
            out_fields: vec![
                "Geodesign_ProjectID".to_string(),
                "Geodesign_ScenarioID".to_string(),
                "Intervention_type".to_string(),
            ],
            return_geometry: false,
            return_distinct_values: true,
        }
    }

    pub fn out_fields_param(&self) -> String {
        self.out_fields.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_is_closed_polygon() {
        let drawn = DrawnGeometry::rectangle(0.0, 0.0, 2.0, 1.0);
        let geojson::Value::Polygon(rings) = &drawn.geometry.value else {
            panic!("expected polygon");
        };
        assert_eq!(rings[0].len(), 5);
        assert_eq!(rings[0].first(), rings[0].last());
        assert_eq!(geometry_type_name(&drawn.geometry.value), "Polygon");
    }

    #[test]
    fn test_intersecting_query() {
        let drawn = DrawnGeometry::rectangle(0.0, 0.0, 1.0, 1.0);
        let query = FeatureQuery::intersecting(drawn.geometry.clone());
        assert_eq!(query.where_clause, "1=1");
        assert_eq!(query.spatial_relationship.as_esri(), "esriSpatialRelIntersects");
        assert_eq!(query.geometry, Some(drawn.geometry));
    }

    #[test]
    fn test_intervention_summary_query() {
        let query = FeatureQuery::intervention_summary();
        assert!(query.return_distinct_values);
        assert!(!query.return_geometry);
        assert_eq!(
            query.out_fields_param(),
            "Geodesign_ProjectID,Geodesign_ScenarioID,Intervention_type"
        );
    }
}
