use super::models::{HealthCheck, UIConfiguration};
use crate::common::test_helpers::{extract_response_body, send};
use crate::config::Config;
use crate::config::test_helpers::setup_test_app;
use axum::http::StatusCode;

#[test]
fn test_ui_configuration_default() {
    let config = UIConfiguration::default();
    assert_eq!(config.app_name, "");
    assert_eq!(config.deployment, "");
    assert!(config.options.spray_types.is_empty());
}

#[test]
fn test_ui_configuration_lists_enum_options() {
    let config = UIConfiguration::new(&Config::for_tests());
    assert_eq!(config.app_name, "spray-api-test");
    assert_eq!(config.options.roles, ["ADMIN", "SUPERVISOR", "SPRAYER"]);
    assert_eq!(config.options.spray_types, ["PRINCIPAL", "SECUNDARIA"]);
    assert_eq!(
        config.options.spray_statuses,
        ["PLANNED", "IN_PROGRESS", "COMPLETED", "CANCELLED"]
    );
    assert_eq!(config.options.wall_types.len(), 6);
    assert_eq!(config.options.roof_types.len(), 6);
    assert_eq!(
        config.options.reasons_not_sprayed,
        ["RECUSA", "FECHADA", "DOENTE", "FUNERAL", "OUTRO"]
    );
}

#[test]
fn test_health_check_serialization() {
    let health = HealthCheck {
        status: "ok".to_string(),
    };
    let json = serde_json::to_string(&health).unwrap();
    assert_eq!(json, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn test_public_routes_need_no_session() {
    let app = setup_test_app().await;

    let (status, body) =
        extract_response_body(send(&app.router, "GET", "/healthz", None, None).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) =
        extract_response_body(send(&app.router, "GET", "/api/config", None, None).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deployment"], "test");
    assert_eq!(body["options"]["wall_types"][0], "MATOPE");
}

#[tokio::test]
async fn test_api_docs_are_served() {
    let app = setup_test_app().await;
    let response = send(&app.router, "GET", "/api/docs", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
