//! Integration tests for directory lookups against a stub feature service.
//!
//! The stub answers by the `where` clause the client sends, the same way the
//! hosted feature service filters its table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use literacy_census_client::directory::{DirectoryClient, DirectoryError, District, School};
use literacy_census_integration_tests::{serve, url};
use serde_json::{Value, json};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn feature_service(
    State(seen): State<Seen>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let where_clause = params.get("where").cloned().unwrap_or_default();
    seen.lock().expect("lock").push(params);

    let body = match where_clause.as_str() {
        "1=1" => json!({
            "features": [
                { "attributes": { "STABR": "VT" } },
                { "attributes": { "STABR": "AK" } },
                { "attributes": { "STABR": "VT" } },
                { "attributes": { "STABR": "" } }
            ]
        }),
        "STABR='VT'" => json!({
            "features": [
                { "attributes": { "LEAID": "5000003", "LEA_NAME": "windham Southeast" } },
                { "attributes": { "LEAID": "5000001", "LEA_NAME": "Addison Central" } },
                { "attributes": { "LEAID": "5000009", "LEA_NAME": null } }
            ]
        }),
        "LEAID='5000001'" => json!({
            "features": [
                { "attributes": { "NCESSCH": 500000100002_i64, "SCH_NAME": "Mary Hogan" } },
                { "attributes": { "NCESSCH": "500000100001", "SCH_NAME": "Bridport Central" } }
            ]
        }),
        "STABR='ZZ'" => json!({}),
        "LEAID='O''Brien'" => json!({ "features": [] }),
        _ => json!({
            "error": { "code": 400, "message": "Invalid query parameters" }
        }),
    };
    Json(body)
}

async fn start() -> (DirectoryClient, Seen) {
    let seen: Seen = Arc::default();
    let router = Router::new()
        .route("/query", get(feature_service))
        .with_state(Arc::clone(&seen));
    let addr = serve(router).await.expect("bind stub");
    let client = DirectoryClient::new(url(addr, "/query").expect("url")).expect("client");
    (client, seen)
}

#[tokio::test]
async fn test_states_sorted_and_deduplicated() {
    let (client, seen) = start().await;

    let states = client.states().await.expect("states");
    assert_eq!(states, ["AK", "VT"]);

    let params = seen.lock().expect("lock").pop().expect("one request");
    assert_eq!(params.get("f").map(String::as_str), Some("json"));
    assert_eq!(params.get("returnDistinctValues").map(String::as_str), Some("true"));
    assert_eq!(params.get("returnGeometry").map(String::as_str), Some("false"));
}

#[tokio::test]
async fn test_districts_sorted_by_name_ignoring_case() {
    let (client, _) = start().await;

    let districts = client.districts("VT").await.expect("districts");
    assert_eq!(
        districts,
        [
            District {
                id: "5000001".to_owned(),
                name: "Addison Central".to_owned()
            },
            District {
                id: "5000003".to_owned(),
                name: "windham Southeast".to_owned()
            },
        ]
    );
}

#[tokio::test]
async fn test_schools_accept_numeric_ids() {
    let (client, seen) = start().await;

    let schools = client.schools("5000001").await.expect("schools");
    assert_eq!(
        schools,
        [
            School {
                id: "500000100001".to_owned(),
                name: "Bridport Central".to_owned()
            },
            School {
                id: "500000100002".to_owned(),
                name: "Mary Hogan".to_owned()
            },
        ]
    );

    let params = seen.lock().expect("lock").pop().expect("one request");
    assert_eq!(params.get("outFields").map(String::as_str), Some("NCESSCH,SCH_NAME"));
}

#[tokio::test]
async fn test_missing_features_is_empty() {
    let (client, _) = start().await;
    assert!(client.districts("ZZ").await.expect("districts").is_empty());
}

#[tokio::test]
async fn test_quotes_in_values_are_escaped() {
    let (client, _) = start().await;
    assert!(client.schools("O'Brien").await.expect("schools").is_empty());
}

#[tokio::test]
async fn test_api_error_surfaces() {
    let (client, _) = start().await;

    let err = client.schools("bogus").await.expect_err("api error");
    assert!(matches!(err, DirectoryError::Api { code: 400, .. }));
}

#[tokio::test]
async fn test_http_error_surfaces() {
    async fn unavailable() -> impl IntoResponse {
        (StatusCode::SERVICE_UNAVAILABLE, "down for maintenance")
    }
    let addr = serve(Router::new().route("/query", get(unavailable)))
        .await
        .expect("bind stub");
    let client = DirectoryClient::new(url(addr, "/query").expect("url")).expect("client");

    let err = client.states().await.expect_err("status error");
    assert!(matches!(err, DirectoryError::Status { status: 503 }));
}
