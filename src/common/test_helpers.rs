//! Request helpers and builders shared by the HTTP test suites.
//!
//! Builders follow the campaign hierarchy: Province -> District -> Locality
//! -> Community, ActorType -> Actor, and SprayConfiguration. They go through
//! the API as the admin user and panic on anything but success.
use crate::config::test_helpers::TestApp;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

/// Extract response body as JSON for testing
pub async fn extract_response_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body: Value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| json!({"error": "Invalid JSON response"}));
    (status, body)
}

/// Sends one request through the router and returns the raw response
pub async fn send(
    router: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn get(router: &axum::Router, uri: &str, token: &str) -> (StatusCode, Value) {
    extract_response_body(send(router, "GET", uri, Some(token), None).await).await
}

pub async fn post(
    router: &axum::Router,
    uri: &str,
    token: &str,
    body: Value,
) -> (StatusCode, Value) {
    extract_response_body(send(router, "POST", uri, Some(token), Some(body)).await).await
}

pub async fn put(
    router: &axum::Router,
    uri: &str,
    token: &str,
    body: Value,
) -> (StatusCode, Value) {
    extract_response_body(send(router, "PUT", uri, Some(token), Some(body)).await).await
}

pub async fn delete(router: &axum::Router, uri: &str, token: &str) -> StatusCode {
    send(router, "DELETE", uri, Some(token), None).await.status()
}

/// `?filter=..` query string for list endpoints
pub fn filter_query(filter: &Value) -> String {
    format!(
        "filter={}",
        url_encode(&filter.to_string())
    )
}

/// Percent-encodes everything outside the unreserved set
pub fn url_encode(raw: &str) -> String {
    raw.bytes()
        .map(|byte| match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (byte as char).to_string()
            }
            other => format!("%{other:02X}"),
        })
        .collect()
}

fn id_of(body: &Value) -> Uuid {
    Uuid::parse_str(body["id"].as_str().expect("response has no id")).unwrap()
}

async fn create_as_admin(app: &TestApp, uri: &str, payload: Value) -> Uuid {
    let (status, body) = post(&app.router, uri, &app.admin.token, payload).await;
    assert_eq!(status, StatusCode::CREATED, "POST {uri} failed: {body:?}");
    id_of(&body)
}

pub async fn create_province(app: &TestApp, name: &str) -> Uuid {
    create_as_admin(app, "/api/provinces", json!({"name": name, "code": null})).await
}

pub async fn create_district(app: &TestApp, province_id: Uuid, name: &str) -> Uuid {
    create_as_admin(
        app,
        "/api/districts",
        json!({"name": name, "code": null, "province_id": province_id}),
    )
    .await
}

pub async fn create_locality(app: &TestApp, district_id: Uuid, name: &str) -> Uuid {
    create_as_admin(
        app,
        "/api/localities",
        json!({"name": name, "code": null, "district_id": district_id}),
    )
    .await
}

pub async fn create_community(app: &TestApp, locality_id: Uuid, name: &str) -> Uuid {
    create_as_admin(
        app,
        "/api/communities",
        json!({"name": name, "code": null, "locality_id": locality_id}),
    )
    .await
}

/// One branch of the geographic hierarchy
#[derive(Clone, Copy, Debug)]
pub struct Hierarchy {
    pub province_id: Uuid,
    pub district_id: Uuid,
    pub locality_id: Uuid,
    pub community_id: Uuid,
}

/// Province, district, locality and community all named after `prefix`
pub async fn create_hierarchy(app: &TestApp, prefix: &str) -> Hierarchy {
    let province_id = create_province(app, &format!("{prefix} Province")).await;
    let district_id = create_district(app, province_id, &format!("{prefix} District")).await;
    let locality_id = create_locality(app, district_id, &format!("{prefix} Locality")).await;
    let community_id = create_community(app, locality_id, &format!("{prefix} Community")).await;
    Hierarchy {
        province_id,
        district_id,
        locality_id,
        community_id,
    }
}

pub async fn create_actor_type(app: &TestApp, name: &str) -> Uuid {
    create_as_admin(
        app,
        "/api/actor-types",
        json!({"name": name, "description": null}),
    )
    .await
}

pub async fn create_actor(app: &TestApp, actor_type_id: Uuid, name: &str) -> Uuid {
    create_as_admin(
        app,
        "/api/actors",
        json!({
            "name": name,
            "number": null,
            "is_active": true,
            "actor_type_id": actor_type_id
        }),
    )
    .await
}

/// A sprayer and the brigade chief supervising them
#[derive(Clone, Copy, Debug)]
pub struct FieldTeam {
    pub sprayer_id: Uuid,
    pub brigade_chief_id: Uuid,
}

pub async fn create_field_team(app: &TestApp) -> FieldTeam {
    let sprayer_type = create_actor_type(app, "Sprayer").await;
    let chief_type = create_actor_type(app, "Brigade Chief").await;
    FieldTeam {
        sprayer_id: create_actor(app, sprayer_type, "Joao Sprayer").await,
        brigade_chief_id: create_actor(app, chief_type, "Maria Chief").await,
    }
}

pub async fn create_configuration(
    app: &TestApp,
    year: i32,
    province_id: Option<Uuid>,
    spray_target: i32,
) -> Uuid {
    create_as_admin(
        app,
        "/api/spray-configurations",
        json!({
            "year": year,
            "province_id": province_id,
            "district_id": null,
            "spray_target": spray_target,
            "proposed_spray_days": 10,
            "spray_rounds": 1,
            "days_between_rounds": 0,
            "is_active": true,
            "description": null,
            "notes": null
        }),
    )
    .await
}

/// A valid spray total payload; tests override fields as needed
pub fn spray_total_payload(
    hierarchy: &Hierarchy,
    team: &FieldTeam,
    spray_date: &str,
    found: i32,
    sprayed: i32,
) -> Value {
    json!({
        "sprayer_id": team.sprayer_id,
        "brigade_chief_id": team.brigade_chief_id,
        "community_id": hierarchy.community_id,
        "spray_type": "PRINCIPAL",
        "spray_date": spray_date,
        "insecticide": "Actellic 300CS",
        "structures_found": found,
        "structures_sprayed": sprayed,
        "compartments_sprayed": sprayed * 3,
        "wall_type": "MATOPE",
        "roof_type": "CAPIM",
        "total_population": found * 5,
        "children_under_5": found,
        "pregnant_women": found / 10
    })
}

/// Creates a spray total with `token` and returns its JSON body
pub async fn create_spray_total(app: &TestApp, token: &str, payload: Value) -> Value {
    let (status, body) = post(&app.router, "/api/spray-totals", token, payload).await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create spray total: {body:?}");
    body
}
