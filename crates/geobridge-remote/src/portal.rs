//! Content platform adapter for an ArcGIS-style portal sharing API.

use async_trait::async_trait;
use chrono::DateTime;
use geobridge_core::error::{BridgeError, ResponseBody, Result};
use geobridge_core::models::{
    Credential, FeatureQuery, LoadedResource, PortalUser, ResourceDescriptor, ResourceHandle,
    ResourceId, ResourceQuery, Session, SubResource,
};
use geobridge_core::models::resource::is_layer_item_type;
use geobridge_core::ports::ContentPlatform;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::client::{ClientConfig, RemoteClient, RequestOptions, StatusMessages};

/// Item types whose service endpoint lists queryable sub-layers
const SERVICE_TYPES: &[&str] = &["Feature Service", "Map Service"];

/// Portal adapter implementing [`ContentPlatform`]
#[derive(Debug, Clone)]
pub struct PortalClient {
    client: RemoteClient,
}

impl PortalClient {
    pub fn new(portal_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let config = ClientConfig::new(portal_url, timeout).with_messages(StatusMessages {
            unauthorized: "The portal rejected the credential, sign in again".to_string(),
            bad_request: "The portal item does not exist or you do not have access to it"
                .to_string(),
        });
        Ok(Self { client: RemoteClient::new(config)? })
    }

    fn sharing_rest(portal_url: &str, path: &str) -> String {
        format!("{}/sharing/rest/{}", portal_url.trim_end_matches('/'), path)
    }

    fn options(token: Option<&str>, format: &str) -> RequestOptions {
        let options = RequestOptions::new().param("f", format);
        match token {
            Some(token) => options.param("token", token),
            None => options,
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, options: RequestOptions) -> Result<T> {
        let value: Value = self.client.get_json(url, options).await?;
        let value = check_error_envelope(value)?;
        serde_json::from_value(value)
            .map_err(|e| BridgeError::Serialization(format!("Unexpected portal response: {}", e)))
    }

    async fn hydrate(&self, service_url: &str, token: Option<&str>) -> Result<Vec<SubResource>> {
        let info: ServiceInfo = self.get(service_url, Self::options(token, "json")).await?;
        let base = service_url.trim_end_matches('/');

        Ok(info
            .layers
            .into_iter()
            .map(|layer| SubResource {
                id: layer.id,
                title: layer.name,
                url: format!("{}/{}", base, layer.id),
            })
            .collect())
    }
}

#[async_trait]
impl ContentPlatform for PortalClient {
    async fn current_user(
        &self,
        portal_url: &str,
        credential: &Credential,
    ) -> Result<Option<PortalUser>> {
        let url = Self::sharing_rest(portal_url, "community/self");
        let value: Value = self.get(&url, Self::options(Some(&credential.token), "json")).await?;

        // Anonymous portals answer without a username
        if value.get("username").and_then(Value::as_str).is_none() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| BridgeError::Serialization(format!("Unexpected user response: {}", e)))
    }

    async fn list_resources(
        &self,
        session: &Session,
        query: &ResourceQuery,
    ) -> Result<Vec<ResourceDescriptor>> {
        let url = Self::sharing_rest(&session.portal_url, "search");
        let options = Self::options(session.token(), "json")
            .param("q", &query.query)
            .param("sortField", &query.sort_field)
            .param("sortOrder", query.sort_order.as_str())
            .param("num", query.num);

        let response: SearchResponse = self.get(&url, options).await?;
        tracing::debug!(
            count = response.results.len(),
            query = %query.query,
            "Portal search finished"
        );

        Ok(response
            .results
            .into_iter()
            .take(query.num as usize)
            .map(PortalItem::into_descriptor)
            .collect())
    }

    async fn load_resource(
        &self,
        session: &Session,
        descriptor: &ResourceDescriptor,
    ) -> Result<LoadedResource> {
        let url = Self::sharing_rest(
            &session.portal_url,
            &format!("content/items/{}", descriptor.id),
        );
        let item: PortalItem = self.get(&url, Self::options(session.token(), "json")).await?;
        let descriptor = item.into_descriptor();

        let sub_resources = match descriptor.url.as_deref() {
            Some(service_url) if is_multi_layer_service(&descriptor.item_type, service_url) => {
                self.hydrate(service_url, session.token()).await?
            }
            _ => Vec::new(),
        };

        tracing::info!(
            resource = %descriptor.id,
            title = %descriptor.title,
            sub_resources = sub_resources.len(),
            "Loaded portal resource"
        );

        Ok(LoadedResource {
            handle: ResourceHandle {
                item_type: descriptor.item_type.clone(),
                url: descriptor.url.clone(),
            },
            descriptor,
            sub_resources,
        })
    }

    async fn query_features(
        &self,
        session: &Session,
        layer: &SubResource,
        query: &FeatureQuery,
    ) -> Result<geojson::FeatureCollection> {
        let url = format!("{}/query", layer.url.trim_end_matches('/'));
        let mut options = Self::options(session.token(), "geojson")
            .param("where", &query.where_clause)
            .param("outFields", query.out_fields_param())
            .param("returnGeometry", query.return_geometry)
            .param("returnDistinctValues", query.return_distinct_values)
            .param("outSR", 4326);

        if let Some(geometry) = &query.geometry {
            let (esri, geometry_type) = esri_geometry(geometry).ok_or_else(|| {
                BridgeError::Validation(
                    "Geometry collections cannot be used as a query filter".to_string(),
                )
            })?;
            options = options
                .param("geometry", esri)
                .param("geometryType", geometry_type)
                .param("inSR", 4326)
                .param("spatialRel", query.spatial_relationship.as_esri());
        }

        self.get(&url, options).await
    }
}

fn is_multi_layer_service(item_type: &str, url: &str) -> bool {
    let is_service = SERVICE_TYPES.iter().any(|t| t.eq_ignore_ascii_case(item_type));
    // ".../FeatureServer/3" points at a single layer, not at the service
    let single_layer = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .is_some_and(|last| last.chars().all(|c| c.is_ascii_digit()));
    is_service && !single_layer
}

/// Portal APIs report many failures as `{"error": {...}}` inside a 200 response
fn check_error_envelope(value: Value) -> Result<Value> {
    let Some(error) = value.get("error") else {
        return Ok(value);
    };

    let code = error
        .get("code")
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok())
        .unwrap_or(500);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Portal request failed")
        .to_string();

    Err(match code {
        401 | 403 | 498 | 499 => BridgeError::Authorization { status: code, message },
        400 | 404 => BridgeError::ResourceAccess { status: code, message },
        _ => BridgeError::Http { status: code, body: ResponseBody::Json(error.clone()) },
    })
}

/// Convert a GeoJSON geometry into the JSON geometry the query endpoint expects
fn esri_geometry(geometry: &geojson::Geometry) -> Option<(Value, &'static str)> {
    let sr = json!({ "wkid": 4326 });
    match &geometry.value {
        geojson::Value::Point(p) => Some((
            json!({ "x": p.first()?, "y": p.get(1)?, "spatialReference": sr }),
            "esriGeometryPoint",
        )),
        geojson::Value::MultiPoint(points) => {
            Some((json!({ "points": points, "spatialReference": sr }), "esriGeometryMultipoint"))
        }
        geojson::Value::LineString(line) => {
            Some((json!({ "paths": [line], "spatialReference": sr }), "esriGeometryPolyline"))
        }
        geojson::Value::MultiLineString(lines) => {
            Some((json!({ "paths": lines, "spatialReference": sr }), "esriGeometryPolyline"))
        }
        geojson::Value::Polygon(rings) => {
            Some((json!({ "rings": rings, "spatialReference": sr }), "esriGeometryPolygon"))
        }
        geojson::Value::MultiPolygon(polygons) => {
            let rings: Vec<_> = polygons.iter().flatten().collect();
            Some((json!({ "rings": rings, "spatialReference": sr }), "esriGeometryPolygon"))
        }
        geojson::Value::GeometryCollection(_) => None,
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<PortalItem>,
}

#[derive(Debug, Deserialize)]
struct PortalItem {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "type")]
    item_type: String,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    modified: Option<i64>,
    #[serde(default, rename = "typeKeywords")]
    type_keywords: Vec<String>,
}

impl PortalItem {
    fn into_descriptor(self) -> ResourceDescriptor {
        let display_name = display_name(&self.item_type, &self.type_keywords);
        ResourceDescriptor {
            id: ResourceId::new(self.id),
            title: self.title,
            is_layer: is_layer_item_type(&self.item_type),
            display_name,
            item_type: self.item_type,
            snippet: self.snippet,
            url: self.url.filter(|u| !u.is_empty()),
            modified: self.modified.and_then(DateTime::from_timestamp_millis),
        }
    }
}

/// Human-facing layer name for a portal item type
fn display_name(item_type: &str, type_keywords: &[String]) -> String {
    let is_table = type_keywords.iter().any(|k| k == "Table");
    match item_type {
        "Feature Service" if is_table => "Table",
        "Feature Service" => "Feature Layer",
        "Map Service" => "Map Image Layer",
        "Image Service" => "Imagery Layer",
        "Vector Tile Service" => "Vector Tile Layer",
        "Scene Service" => "Scene Layer",
        other => other,
    }
    .to_string()
}

#[derive(Debug, Deserialize)]
struct ServiceInfo {
    #[serde(default)]
    layers: Vec<ServiceLayer>,
}

#[derive(Debug, Deserialize)]
struct ServiceLayer {
    id: u32,
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_layer_service_detection() {
        let base = "https://services.arcgis.com/abc/arcgis/rest/services/Scenario/FeatureServer";
        assert!(is_multi_layer_service("Feature Service", base));
        assert!(!is_multi_layer_service("Feature Service", &format!("{}/2", base)));
        assert!(!is_multi_layer_service("Vector Tile Service", base));
    }

    #[test]
    fn test_error_envelope_classification() {
        let err = check_error_envelope(json!({"error": {"code": 498, "message": "Invalid token."}}))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Authorization { status: 498, .. }));

        let err =
            check_error_envelope(json!({"error": {"code": 400, "message": "Item does not exist"}}))
                .unwrap_err();
        assert!(matches!(err, BridgeError::ResourceAccess { status: 400, .. }));

        // 65937 would wrap to 401
        let err = check_error_envelope(json!({"error": {"code": 65937, "message": "odd"}}))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Http { status: 500, .. }));

        let ok = check_error_envelope(json!({"results": []})).unwrap();
        assert!(ok.get("results").is_some());
    }

    #[test]
    fn test_esri_polygon_geometry() {
        let geometry = geojson::Geometry::new(geojson::Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ]]));
        let (esri, kind) = esri_geometry(&geometry).unwrap();
        assert_eq!(kind, "esriGeometryPolygon");
        assert_eq!(esri["rings"][0][1], json!([1.0, 0.0]));
        assert_eq!(esri["spatialReference"]["wkid"], 4326);
    }

    #[test]
    fn test_item_into_descriptor() {
        let item: PortalItem = serde_json::from_value(json!({
            "id": "9f3c",
            "title": "Scenario A",
            "type": "Feature Service",
            "url": "",
            "modified": 1_700_000_000_000i64,
            "typeKeywords": ["Data", "Service"]
        }))
        .unwrap();

        let descriptor = item.into_descriptor();
        assert!(descriptor.is_layer);
        assert_eq!(descriptor.display_name, "Feature Layer");
        assert_eq!(descriptor.url, None);
        assert!(descriptor.modified.is_some());
    }
}
