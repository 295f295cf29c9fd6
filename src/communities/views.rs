use super::models::{Community, CommunityCreate, CommunityUpdate, get_all_handler, get_one_handler, __path_get_all_handler, __path_get_one_handler};
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
        AccessPolicy::reference_data(Community::RESOURCE_NAME_PLURAL),
        Community::RESOURCE_NAME_SINGULAR,
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
    request_body = CommunityCreate,
    responses(
        (status = 201, body = Community),
        (status = 400, description = "Invalid input or unknown locality"),
        (status = 409, description = "The locality already has a community with this name")
    ),
    tag = "communities"
)]
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<CommunityCreate>,
) -> BusinessResult<(StatusCode, Json<Community>)> {
    let created = Community::create(&state.db, data)
        .await
        .map_err(|e| e.to_business_error(Community::RESOURCE_NAME_SINGULAR))?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Community ID")),
    request_body = CommunityUpdate,
    responses(
        (status = 200, body = Community),
        (status = 400, description = "Invalid input or unknown locality"),
        (status = 404, description = "Community not found")
    ),
    tag = "communities"
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<CommunityUpdate>,
) -> BusinessResult<Json<Community>> {
    Community::update(&state.db, id, data)
        .await
        .map(Json)
        .map_err(|e| write_error(e, Community::RESOURCE_NAME_SINGULAR, id))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Community ID")),
    responses(
        (status = 204, description = "Community deleted"),
        (status = 404, description = "Community not found"),
        (status = 409, description = "Spray totals still reference this community")
    ),
    tag = "communities"
)]
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> BusinessResult<StatusCode> {
    Community::delete(&state.db, id)
        .await
        .map_err(|e| write_error(e, Community::RESOURCE_NAME_SINGULAR, id))?;
    tracing::info!(username = %user.username, community_id = %id, "Deleted community");
    Ok(StatusCode::NO_CONTENT)
}
