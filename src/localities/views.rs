use super::models::{
    self as localities, Locality, LocalityCreate, LocalityUpdate, get_all_handler,
    get_one_handler, __path_get_all_handler, __path_get_one_handler};
use crate::common::auth::{AccessPolicy, CurrentUser};
use crate::common::crud::{guarded_router, write_error};
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::common::state::AppState;
use crate::communities::models::{self as communities, CommunityList};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use crudcrate::CRUDResource;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router(state: &AppState) -> OpenApiRouter {
    guarded_router(
        state,
        AccessPolicy::reference_data(Locality::RESOURCE_NAME_PLURAL),
        Locality::RESOURCE_NAME_SINGULAR,
        OpenApiRouter::new()
            .routes(routes!(get_one_handler))
            .routes(routes!(get_all_handler)),
        OpenApiRouter::new()
            .routes(routes!(create))
            .routes(routes!(update, delete))
            .routes(routes!(list_locality_communities)),
    )
}

#[utoipa::path(
    post,
    path = "/",
    request_body = LocalityCreate,
    responses(
        (status = 201, body = Locality),
        (status = 400, description = "Invalid input or unknown district"),
        (status = 409, description = "The district already has a locality with this name")
    ),
    tag = "localities"
)]
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<LocalityCreate>,
) -> BusinessResult<(StatusCode, Json<Locality>)> {
    let created = Locality::create(&state.db, data)
        .await
        .map_err(|e| e.to_business_error(Locality::RESOURCE_NAME_SINGULAR))?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Locality ID")),
    request_body = LocalityUpdate,
    responses(
        (status = 200, body = Locality),
        (status = 400, description = "Invalid input or unknown district"),
        (status = 404, description = "Locality not found")
    ),
    tag = "localities"
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<LocalityUpdate>,
) -> BusinessResult<Json<Locality>> {
    Locality::update(&state.db, id, data)
        .await
        .map(Json)
        .map_err(|e| write_error(e, Locality::RESOURCE_NAME_SINGULAR, id))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Locality ID")),
    responses(
        (status = 204, description = "Locality and its subtree deleted"),
        (status = 404, description = "Locality not found"),
        (status = 409, description = "Spray totals still reference a community in this locality")
    ),
    tag = "localities"
)]
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> BusinessResult<StatusCode> {
    Locality::delete(&state.db, id)
        .await
        .map_err(|e| write_error(e, Locality::RESOURCE_NAME_SINGULAR, id))?;
    tracing::info!(username = %user.username, locality_id = %id, "Deleted locality");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/communities",
    params(("id" = Uuid, Path, description = "Locality ID")),
    responses(
        (status = 200, description = "Communities of the locality", body = Vec<CommunityList>),
        (status = 404, description = "Locality not found")
    ),
    tag = "localities"
)]
pub async fn list_locality_communities(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> BusinessResult<Json<Vec<CommunityList>>> {
    let locality = localities::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| e.to_business_error(Locality::RESOURCE_NAME_SINGULAR))?
        .ok_or_else(|| crate::not_found!(Locality::RESOURCE_NAME_SINGULAR, id))?;

    let rows = communities::Entity::find()
        .filter(communities::Column::LocalityId.eq(id))
        .order_by_asc(communities::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("community"))?;

    Ok(Json(
        rows.into_iter()
            .map(|model| {
                let mut community = CommunityList::from(model);
                community.locality_name = Some(locality.name.clone());
                community
            })
            .collect(),
    ))
}
