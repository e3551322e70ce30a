//! Reading the query geometry of `geobridge analyze`.

use crate::errors::{self, CliError};
use geobridge_core::models::DrawnGeometry;
use geojson::GeoJson;
use std::path::Path;

/// Inline GeoJSON or a path to a GeoJSON file holding a Geometry or a Feature
pub fn parse_geometry(input: &str) -> Result<DrawnGeometry, CliError> {
    let trimmed = input.trim();
    let text = if trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        let path = Path::new(trimmed);
        std::fs::read_to_string(path).map_err(|e| errors::invalid_geometry(input, &e.to_string()))?
    };

    let geojson: GeoJson =
        text.parse().map_err(|e: geojson::Error| errors::invalid_geometry(input, &e.to_string()))?;

    let geometry = match geojson {
        GeoJson::Geometry(geometry) => Some(geometry),
        GeoJson::Feature(feature) => feature.geometry,
        GeoJson::FeatureCollection(_) => {
            return Err(errors::invalid_geometry(
                input,
                "expected a single Geometry or Feature, got a FeatureCollection",
            ))
        }
    };

    geometry
        .map(DrawnGeometry::new)
        .ok_or_else(|| errors::invalid_geometry(input, "the feature has no geometry"))
}
