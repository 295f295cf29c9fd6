use super::models::{ActorType, ActorTypeCreate, ActorTypeUpdate, get_all_handler, get_one_handler, __path_get_all_handler, __path_get_one_handler};
use crate::common::auth::AccessPolicy;
use crate::common::crud::{guarded_router, write_error};
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::common::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use crudcrate::CRUDResource;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router(state: &AppState) -> OpenApiRouter {
    guarded_router(
        state,
        AccessPolicy::reference_data(ActorType::RESOURCE_NAME_PLURAL),
        ActorType::RESOURCE_NAME_SINGULAR,
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
    request_body = ActorTypeCreate,
    responses((status = 201, body = ActorType), (status = 409, description = "Name taken")),
    tag = "actor-types"
)]
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<ActorTypeCreate>,
) -> BusinessResult<(StatusCode, Json<ActorType>)> {
    let created = ActorType::create(&state.db, data)
        .await
        .map_err(|e| e.to_business_error(ActorType::RESOURCE_NAME_SINGULAR))?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Actor type ID")),
    request_body = ActorTypeUpdate,
    responses((status = 200, body = ActorType), (status = 404)),
    tag = "actor-types"
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<ActorTypeUpdate>,
) -> BusinessResult<Json<ActorType>> {
    ActorType::update(&state.db, id, data)
        .await
        .map(Json)
        .map_err(|e| write_error(e, ActorType::RESOURCE_NAME_SINGULAR, id))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Actor type ID")),
    responses(
        (status = 204),
        (status = 404),
        (status = 409, description = "Actors still use this type")
    ),
    tag = "actor-types"
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> BusinessResult<StatusCode> {
    ActorType::delete(&state.db, id)
        .await
        .map_err(|e| write_error(e, ActorType::RESOURCE_NAME_SINGULAR, id))?;
    Ok(StatusCode::NO_CONTENT)
}
