use super::models::{
    SprayConfiguration, SprayConfigurationCreate, SprayConfigurationUpdate, get_all_handler,
    get_one_handler, __path_get_all_handler, __path_get_one_handler};
use crate::common::auth::{AccessPolicy, CurrentUser};
use crate::common::crud::{guarded_router, write_error};
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::common::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use crudcrate::CRUDResource;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router(state: &AppState) -> OpenApiRouter {
    guarded_router(
        state,
        AccessPolicy::reference_data(SprayConfiguration::RESOURCE_NAME_PLURAL),
        SprayConfiguration::RESOURCE_NAME_SINGULAR,
        OpenApiRouter::new()
            .routes(routes!(get_one_handler))
            .routes(routes!(get_all_handler)),
        OpenApiRouter::new()
            .routes(routes!(create))
            .routes(routes!(update, delete)),
    )
}

#[utoipa::path(
    post,
    path = "/",
    request_body = SprayConfigurationCreate,
    responses(
        (status = 201, body = SprayConfiguration),
        (status = 400, description = "Out of range values or inconsistent scope")
    ),
    tag = "spray-configurations"
)]
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<SprayConfigurationCreate>,
) -> BusinessResult<(StatusCode, Json<SprayConfiguration>)> {
    let created = SprayConfiguration::create(&state.db, data)
        .await
        .map_err(|e| e.to_business_error(SprayConfiguration::RESOURCE_NAME_SINGULAR))?;
    tracing::info!(
        username = %user.username,
        configuration_id = %created.id,
        year = created.year,
        "Created spray configuration"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Spray configuration ID")),
    request_body = SprayConfigurationUpdate,
    responses(
        (status = 200, body = SprayConfiguration),
        (status = 400, description = "Out of range values or inconsistent scope"),
        (status = 404, description = "Spray configuration not found")
    ),
    tag = "spray-configurations"
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<SprayConfigurationUpdate>,
) -> BusinessResult<Json<SprayConfiguration>> {
    SprayConfiguration::update(&state.db, id, data)
        .await
        .map(Json)
        .map_err(|e| write_error(e, SprayConfiguration::RESOURCE_NAME_SINGULAR, id))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Spray configuration ID")),
    responses(
        (status = 204, description = "Spray configuration deleted; linked spray totals keep no configuration"),
        (status = 404, description = "Spray configuration not found")
    ),
    tag = "spray-configurations"
)]
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> BusinessResult<StatusCode> {
    SprayConfiguration::delete(&state.db, id)
        .await
        .map_err(|e| write_error(e, SprayConfiguration::RESOURCE_NAME_SINGULAR, id))?;
    tracing::info!(username = %user.username, configuration_id = %id, "Deleted spray configuration");
    Ok(StatusCode::NO_CONTENT)
}
