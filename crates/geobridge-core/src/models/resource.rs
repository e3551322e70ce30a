use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of an item on the content platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Item types the platform can turn into a map layer
const LAYER_ITEM_TYPES: &[&str] = &[
    "Feature Service",
    "Map Service",
    "Image Service",
    "Vector Tile Service",
    "Scene Service",
    "Feature Collection",
    "Group Layer",
    "WMS",
    "WMTS",
    "WFS",
    "KML",
    "CSV",
    "GeoJson",
    "Stream Service",
];

pub fn is_layer_item_type(item_type: &str) -> bool {
    LAYER_ITEM_TYPES.iter().any(|t| t.eq_ignore_ascii_case(item_type))
}

/// Metadata about a selectable resource, before it is loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub id: ResourceId,
    pub title: String,
    pub item_type: String,
    pub display_name: String,
    pub snippet: Option<String>,
    pub url: Option<String>,
    pub modified: Option<DateTime<Utc>>,
    pub is_layer: bool,
}

impl ResourceDescriptor {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        item_type: impl Into<String>,
    ) -> Self {
        let item_type = item_type.into();
        Self {
            id: ResourceId::new(id),
            title: title.into(),
            display_name: item_type.clone(),
            is_layer: is_layer_item_type(&item_type),
            item_type,
            snippet: None,
            url: None,
            modified: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Text shown under the title in a resource list
    pub fn list_description(&self) -> String {
        format!("Type: {} | Source: {}", self.display_name, self.item_type)
    }
}

/// Sort direction for resource listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Listing query sent to the content platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuery {
    pub query: String,
    pub sort_field: String,
    pub sort_order: SortOrder,
    pub num: u32,
}

impl ResourceQuery {
    pub const DEFAULT_QUERY: &'static str = "tags:(IGC AND geodesign AND geodesignScenario)";
    pub const DEFAULT_PAGE_SIZE: u32 = 100;

    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Default::default() }
    }

    pub fn with_num(mut self, num: u32) -> Self {
        self.num = num;
        self
    }
}

impl Default for ResourceQuery {
    fn default() -> Self {
        Self {
            query: Self::DEFAULT_QUERY.to_string(),
            sort_field: "modified".to_string(),
            sort_order: SortOrder::Desc,
            num: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// A queryable layer nested inside a loaded resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubResource {
    pub id: u32,
    pub title: String,
    pub url: String,
}

/// What the display needs to render a loaded resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub item_type: String,
    pub url: Option<String>,
}

/// A resource that has been loaded and fully hydrated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedResource {
    pub descriptor: ResourceDescriptor,
    pub handle: ResourceHandle,
    pub sub_resources: Vec<SubResource>,
}

impl LoadedResource {
    pub fn id(&self) -> &ResourceId {
        &self.descriptor.id
    }

    pub fn has_sub_resources(&self) -> bool {
        !self.sub_resources.is_empty()
    }

    /// First sub-resource whose title contains `marker`, ignoring case
    pub fn find_sub_resource(&self, marker: &str) -> Option<&SubResource> {
        let marker = marker.to_lowercase();
        self.sub_resources.iter().find(|s| s.title.to_lowercase().contains(&marker))
    }
}

/// The sub-resource currently targeted by spatial queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSource {
    pub resource: ResourceId,
    pub sub_resource: SubResource,
    /// Bumped on every reassignment; queries carry it to detect stale results
    pub generation: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(titles: &[&str]) -> LoadedResource {
        LoadedResource {
            descriptor: ResourceDescriptor::new("abc", "Scenario A", "Feature Service"),
            handle: ResourceHandle { item_type: "Feature Service".into(), url: None },
            sub_resources: titles
                .iter()
                .enumerate()
                .map(|(i, t)| SubResource {
                    id: i as u32,
                    title: t.to_string(),
                    url: format!("https://example.test/FeatureServer/{}", i),
                })
                .collect(),
        }
    }

    #[test]
    fn test_layer_item_types() {
        assert!(is_layer_item_type("Feature Service"));
        assert!(is_layer_item_type("feature service"));
        assert!(!is_layer_item_type("Web Map"));
        assert!(!ResourceDescriptor::new("1", "Doc", "PDF").is_layer);
    }

    #[test]
    fn test_default_query() {
        let query = ResourceQuery::default();
        assert_eq!(query.num, 100);
        assert_eq!(query.sort_field, "modified");
        assert_eq!(query.sort_order.as_str(), "desc");
        assert!(query.query.contains("geodesignScenario"));
    }

    #[test]
    fn test_find_sub_resource_ignores_case() {
        let resource = loaded(&["Scenario Boundary", "GeoPlanner INTERVENTIONS"]);
        let found = resource.find_sub_resource("interventions").unwrap();
        assert_eq!(found.id, 1);

        let resource = loaded(&["Scenario Boundary"]);
        assert!(resource.find_sub_resource("interventions").is_none());
    }

    #[test]
    fn test_list_description() {
        let descriptor = ResourceDescriptor::new("1", "Roads", "Feature Service");
        assert_eq!(
            descriptor.list_description(),
            "Type: Feature Service | Source: Feature Service"
        );
    }
}
