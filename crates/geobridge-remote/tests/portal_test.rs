//! Integration tests for the portal adapter against a local fake portal

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use geobridge_core::models::{
    Credential, DrawnGeometry, FeatureQuery, ResourceDescriptor, ResourceQuery, Session,
    SubResource,
};
use geobridge_core::ports::ContentPlatform;
use geobridge_core::BridgeError;
use geobridge_remote::PortalClient;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Portal {
    base: Mutex<String>,
    queries: Mutex<Vec<HashMap<String, String>>>,
}

type Params = Query<HashMap<String, String>>;

fn token_ok(params: &HashMap<String, String>) -> bool {
    params.get("token").map(String::as_str) == Some("portal-token")
}

fn invalid_token() -> Json<Value> {
    Json(json!({ "error": { "code": 498, "message": "Invalid token.", "details": [] } }))
}

async fn community_self(Query(params): Params) -> Json<Value> {
    if !token_ok(&params) {
        return invalid_token();
    }
    Json(json!({ "username": "planner_jane", "fullName": "Jane Planner" }))
}

async fn search(State(portal): State<Arc<Portal>>, Query(params): Params) -> Json<Value> {
    portal.queries.lock().unwrap().push(params.clone());
    Json(json!({
        "total": 3,
        "results": [
            { "id": "item-1", "title": "Scenario B", "type": "Feature Service", "modified": 1_700_000_500_000i64 },
            { "id": "item-2", "title": "Notes", "type": "PDF", "modified": 1_700_000_400_000i64 },
            { "id": "item-3", "title": "Scenario A", "type": "Feature Service", "modified": 1_700_000_300_000i64 }
        ]
    }))
}

async fn item(State(portal): State<Arc<Portal>>, Query(params): Params) -> Json<Value> {
    if !token_ok(&params) {
        return invalid_token();
    }
    let base = portal.base.lock().unwrap().clone();
    Json(json!({
        "id": "item-1",
        "title": "Scenario B",
        "type": "Feature Service",
        "url": format!("{}/services/Scenario/FeatureServer", base)
    }))
}

async fn missing_item() -> Json<Value> {
    Json(json!({ "error": { "code": 400, "message": "Item does not exist or is inaccessible." } }))
}

async fn service() -> Json<Value> {
    Json(json!({
        "layers": [
            { "id": 0, "name": "Scenario Boundary" },
            { "id": 1, "name": "GeoPlanner Interventions" }
        ]
    }))
}

async fn layer_query(State(portal): State<Arc<Portal>>, Query(params): Params) -> Json<Value> {
    portal.queries.lock().unwrap().push(params);
    Json(json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 1,
                "properties": { "Intervention_type": "Solar farm" },
                "geometry": { "type": "Point", "coordinates": [0.5, 0.5] }
            }
        ]
    }))
}

async fn spawn_portal() -> (String, Arc<Portal>) {
    let portal = Arc::new(Portal::default());
    let app = Router::new()
        .route("/sharing/rest/community/self", get(community_self))
        .route("/sharing/rest/search", get(search))
        .route("/sharing/rest/content/items/item-1", get(item))
        .route("/sharing/rest/content/items/gone", get(missing_item))
        .route("/services/Scenario/FeatureServer", get(service))
        .route("/services/Scenario/FeatureServer/1/query", get(layer_query))
        .with_state(portal.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    *portal.base.lock().unwrap() = base.clone();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base, portal)
}

fn session(base: &str) -> Session {
    Session::authenticated(base, Credential::new("portal-token", format!("{}/sharing", base)), None)
}

#[tokio::test]
async fn test_current_user() {
    let (base, _) = spawn_portal().await;
    let client = PortalClient::new(&base, Duration::from_secs(5)).unwrap();

    let user = client
        .current_user(&base, &Credential::new("portal-token", &base))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.username, "planner_jane");

    let err = client.current_user(&base, &Credential::new("expired", &base)).await.unwrap_err();
    assert!(matches!(err, BridgeError::Authorization { status: 498, .. }));
}

#[tokio::test]
async fn test_list_resources_sends_listing_parameters() {
    let (base, portal) = spawn_portal().await;
    let client = PortalClient::new(&base, Duration::from_secs(5)).unwrap();

    let resources =
        client.list_resources(&session(&base), &ResourceQuery::default()).await.unwrap();

    assert_eq!(resources.len(), 3);
    assert_eq!(resources[0].title, "Scenario B");
    assert!(!resources[1].is_layer);

    let queries = portal.queries.lock().unwrap();
    let params = &queries[0];
    assert_eq!(params["q"], "tags:(IGC AND geodesign AND geodesignScenario)");
    assert_eq!(params["sortField"], "modified");
    assert_eq!(params["sortOrder"], "desc");
    assert_eq!(params["num"], "100");
    assert_eq!(params["f"], "json");
}

#[tokio::test]
async fn test_load_resource_hydrates_sub_layers() {
    let (base, _) = spawn_portal().await;
    let client = PortalClient::new(&base, Duration::from_secs(5)).unwrap();

    let descriptor = ResourceDescriptor::new("item-1", "Scenario B", "Feature Service");
    let loaded = client.load_resource(&session(&base), &descriptor).await.unwrap();

    assert_eq!(loaded.sub_resources.len(), 2);
    let interventions = loaded.find_sub_resource("interventions").unwrap();
    assert_eq!(interventions.url, format!("{}/services/Scenario/FeatureServer/1", base));
}

#[tokio::test]
async fn test_load_missing_resource() {
    let (base, _) = spawn_portal().await;
    let client = PortalClient::new(&base, Duration::from_secs(5)).unwrap();

    let descriptor = ResourceDescriptor::new("gone", "Gone", "Feature Service");
    let err = client.load_resource(&session(&base), &descriptor).await.unwrap_err();
    assert!(matches!(err, BridgeError::ResourceAccess { status: 400, .. }));
}

#[tokio::test]
async fn test_query_features_with_geometry() {
    let (base, portal) = spawn_portal().await;
    let client = PortalClient::new(&base, Duration::from_secs(5)).unwrap();

    let layer = SubResource {
        id: 1,
        title: "GeoPlanner Interventions".to_string(),
        url: format!("{}/services/Scenario/FeatureServer/1", base),
    };
    let drawn = DrawnGeometry::rectangle(0.0, 0.0, 1.0, 1.0);
    let collection = client
        .query_features(&session(&base), &layer, &FeatureQuery::intersecting(drawn.geometry))
        .await
        .unwrap();

    assert_eq!(collection.features.len(), 1);

    let queries = portal.queries.lock().unwrap();
    let params = queries.last().unwrap();
    assert_eq!(params["where"], "1=1");
    assert_eq!(params["f"], "geojson");
    assert_eq!(params["geometryType"], "esriGeometryPolygon");
    assert_eq!(params["spatialRel"], "esriSpatialRelIntersects");
    assert!(params["geometry"].contains("rings"));
}
