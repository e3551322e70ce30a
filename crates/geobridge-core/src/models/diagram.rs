use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Property holding the planning system of a scenario feature
pub const CATEGORY_PROPERTY: &str = "Intervention_System";

/// Property holding the intervention name of a scenario feature
pub const INTERVENTION_PROPERTY: &str = "Intervention_Type";

/// Identifier of a system inside a diagram project; 0 means "no mapping"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemId(pub u64);

impl SystemId {
    pub const UNMAPPED: SystemId = SystemId(0);

    pub fn is_mapped(&self) -> bool {
        *self != Self::UNMAPPED
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a diagram is created as a project or a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    #[default]
    Project,
    Policy,
}

impl DiagramKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramKind::Project => "project",
            DiagramKind::Policy => "policy",
        }
    }
}

impl std::str::FromStr for DiagramKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "project" => Ok(DiagramKind::Project),
            "policy" => Ok(DiagramKind::Policy),
            _ => Err(BridgeError::ConfigInvalid {
                key: "kind".to_string(),
                reason: format!("Invalid diagram kind: {}. Use project or policy", s),
            }),
        }
    }
}

/// Project metadata returned by the diagram API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub external_connection: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One system (category bucket) of a diagram project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSystem {
    pub id: SystemId,
    pub sysname: String,
    pub syscolor: String,
}

/// A planning feature read from a scenario feature collection
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFeatureRecord {
    /// `None` for a feature with a `null` geometry, which cannot be migrated
    pub geometry: Option<geojson::Geometry>,
    pub category: Option<String>,
    pub intervention: Option<String>,
}

impl SourceFeatureRecord {
    pub fn from_feature(feature: &geojson::Feature) -> Self {
        Self {
            geometry: feature.geometry.clone(),
            category: string_property(feature, CATEGORY_PROPERTY),
            intervention: string_property(feature, INTERVENTION_PROPERTY),
        }
    }

    /// Read every feature of a collection, keeping source order
    pub fn from_collection(collection: &geojson::FeatureCollection) -> Vec<Self> {
        collection.features.iter().map(Self::from_feature).collect()
    }
}

fn string_property(feature: &geojson::Feature, name: &str) -> Option<String> {
    match feature.property(name)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Body of a create-diagram request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub featuretype: String,
    pub description: String,
    pub geometry: geojson::Feature,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_record_from_feature() {
        let feature: geojson::Feature = serde_json::from_value(json!({
            "type": "Feature",
            "id": 7,
            "properties": {
                "Intervention_System": "Energy",
                "Intervention_Type": "Solar farm"
            },
            "geometry": { "type": "Point", "coordinates": [115.0, -8.5] }
        }))
        .unwrap();

        let record = SourceFeatureRecord::from_feature(&feature);
        assert!(record.geometry.is_some());
        assert_eq!(record.category.as_deref(), Some("Energy"));
        assert_eq!(record.intervention.as_deref(), Some("Solar farm"));
    }

    #[test]
    fn test_null_geometry_is_kept_in_position() {
        let collection: geojson::FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "Intervention_Type": "a" },
                  "geometry": { "type": "Point", "coordinates": [0.0, 0.0] } },
                { "type": "Feature", "id": "f-1", "properties": { "Intervention_Type": "b" },
                  "geometry": null },
                { "type": "Feature", "properties": { "Intervention_Type": "c" },
                  "geometry": { "type": "Point", "coordinates": [1.0, 1.0] } }
            ]
        }))
        .unwrap();

        let records = SourceFeatureRecord::from_collection(&collection);
        assert_eq!(records.len(), 3);
        assert!(records[1].geometry.is_none());
        assert_eq!(records[1].intervention.as_deref(), Some("b"));
        assert!(records[2].geometry.is_some());
    }

    #[test]
    fn test_project_system_deserialization() {
        let systems: Vec<ProjectSystem> = serde_json::from_value(json!([
            { "id": 12, "sysname": "ENE", "syscolor": "#AB507E", "extra": true }
        ]))
        .unwrap();
        assert_eq!(systems[0].id, SystemId(12));
        assert!(systems[0].id.is_mapped());
        assert!(!SystemId::UNMAPPED.is_mapped());
    }

    #[test]
    fn test_diagram_kind_parse() {
        assert_eq!("Policy".parse::<DiagramKind>().unwrap(), DiagramKind::Policy);
        assert_eq!(DiagramKind::default().as_str(), "project");
        assert!("plan".parse::<DiagramKind>().is_err());
    }
}
