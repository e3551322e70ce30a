//! Fixtures shared by the layer workflow tests

#![allow(dead_code)]

use geobridge_core::models::{LoadedResource, ResourceDescriptor, ResourceHandle, SubResource};
use geobridge_layers::MemoryPlatform;
use serde_json::json;

pub fn resource(id: &str, item_type: &str, sub_titles: &[&str]) -> LoadedResource {
    let url = format!("https://services.test/{}/FeatureServer", id);
    LoadedResource {
        descriptor: ResourceDescriptor::new(id, format!("Scenario {}", id), item_type)
            .with_url(url.clone()),
        handle: ResourceHandle { item_type: item_type.to_string(), url: Some(url.clone()) },
        sub_resources: sub_titles
            .iter()
            .enumerate()
            .map(|(i, title)| SubResource {
                id: i as u32,
                title: title.to_string(),
                url: format!("{}/{}", url, i),
            })
            .collect(),
    }
}

pub fn point(x: f64, y: f64, intervention: &str) -> geojson::Feature {
    serde_json::from_value(json!({
        "type": "Feature",
        "properties": { "Intervention_type": intervention, "Geodesign_ScenarioID": "s1" },
        "geometry": { "type": "Point", "coordinates": [x, y] }
    }))
    .unwrap()
}

/// Two scenarios with an interventions layer, one layer without sub-resources,
/// one without a matching sub-resource, and one non-layer item
pub fn seeded_platform() -> MemoryPlatform {
    let platform = MemoryPlatform::new();
    platform.insert_resource(resource(
        "a",
        "Feature Service",
        &["Boundary", "GeoPlanner Interventions"],
    ));
    platform.insert_resource(resource(
        "b",
        "Feature Service",
        &["Study Area", "INTERVENTIONS 2050"],
    ));
    platform.insert_resource(resource("basemap", "Vector Tile Service", &[]));
    platform.insert_resource(resource("roads", "Feature Service", &["Roads"]));
    platform.insert_resource(resource("report", "PDF", &[]));

    platform.insert_features(
        "https://services.test/a/FeatureServer/1",
        vec![
            point(0.5, 0.5, "Solar farm"),
            point(5.0, 5.0, "Wind farm"),
            point(0.2, 0.8, "Solar farm"),
        ],
    );
    platform.insert_features(
        "https://services.test/b/FeatureServer/1",
        vec![point(0.5, 0.5, "Mangrove restoration")],
    );
    platform
}

pub fn descriptor(id: &str) -> ResourceDescriptor {
    ResourceDescriptor::new(id, format!("Scenario {}", id), "Feature Service")
}
