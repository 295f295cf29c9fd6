use super::models::{Actor, ActorCreate, ActorUpdate, get_all_handler, get_one_handler, __path_get_all_handler, __path_get_one_handler};
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
        AccessPolicy::reference_data(Actor::RESOURCE_NAME_PLURAL),
        Actor::RESOURCE_NAME_SINGULAR,
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
    request_body = ActorCreate,
    responses((status = 201, body = Actor), (status = 400, description = "Unknown actor type")),
    tag = "actors"
)]
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<ActorCreate>,
) -> BusinessResult<(StatusCode, Json<Actor>)> {
    let created = Actor::create(&state.db, data)
        .await
        .map_err(|e| e.to_business_error(Actor::RESOURCE_NAME_SINGULAR))?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Actor ID")),
    request_body = ActorUpdate,
    responses((status = 200, body = Actor), (status = 404)),
    tag = "actors"
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<ActorUpdate>,
) -> BusinessResult<Json<Actor>> {
    Actor::update(&state.db, id, data)
        .await
        .map(Json)
        .map_err(|e| write_error(e, Actor::RESOURCE_NAME_SINGULAR, id))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Actor ID")),
    responses(
        (status = 204),
        (status = 404),
        (status = 409, description = "Spray totals still reference this actor")
    ),
    tag = "actors"
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> BusinessResult<StatusCode> {
    Actor::delete(&state.db, id)
        .await
        .map_err(|e| write_error(e, Actor::RESOURCE_NAME_SINGULAR, id))?;
    Ok(StatusCode::NO_CONTENT)
}
