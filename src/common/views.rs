use super::models::HealthCheck;
use super::models::UIConfiguration;
use crate::common::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use utoipa_axum::{router::OpenApiRouter, routes};

/// Public routes: health check and client configuration
pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(healthz))
        .routes(routes!(get_ui_config))
        .with_state(state.clone())
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = OK, description = "Database reachable", body = HealthCheck),
        (status = INTERNAL_SERVER_ERROR, description = "Database unreachable", body = HealthCheck)
    ),
    security(()),
    tag = "health"
)]
pub async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<HealthCheck>) {
    if let Err(e) = state.db.ping().await {
        tracing::error!("Health check failed: {e}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthCheck {
                status: "error".to_string(),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(HealthCheck {
            status: "ok".to_string(),
        }),
    )
}

#[utoipa::path(
    get,
    path = "/api/config",
    responses(
        (status = OK, description = "Web UI configuration", body = UIConfiguration)
    ),
    security(()),
    tag = "health"
)]
pub async fn get_ui_config(State(state): State<AppState>) -> Json<UIConfiguration> {
    Json(UIConfiguration::new(&state.config))
}
