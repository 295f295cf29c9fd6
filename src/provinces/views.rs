use super::models::{
    self as provinces, Province, ProvinceCreate, ProvinceUpdate, get_all_handler,
    get_one_handler, __path_get_all_handler, __path_get_one_handler};
use crate::common::auth::{AccessPolicy, CurrentUser};
use crate::common::crud::{guarded_router, write_error};
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::common::state::AppState;
use crate::districts::models::{self as districts, DistrictList};
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
        AccessPolicy::reference_data(Province::RESOURCE_NAME_PLURAL),
        Province::RESOURCE_NAME_SINGULAR,
        OpenApiRouter::new()
            .routes(routes!(get_one_handler))
            .routes(routes!(get_all_handler)),
        OpenApiRouter::new()
            .routes(routes!(create))
            .routes(routes!(update, delete))
            .routes(routes!(list_province_districts)),
    )
}

#[utoipa::path(
    post,
    path = "/",
    request_body = ProvinceCreate,
    responses(
        (status = 201, body = Province),
        (status = 400, description = "Invalid name or code"),
        (status = 409, description = "A province with this name exists")
    ),
    tag = "provinces"
)]
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<ProvinceCreate>,
) -> BusinessResult<(StatusCode, Json<Province>)> {
    let created = Province::create(&state.db, data)
        .await
        .map_err(|e| e.to_business_error(Province::RESOURCE_NAME_SINGULAR))?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Province ID")),
    request_body = ProvinceUpdate,
    responses(
        (status = 200, body = Province),
        (status = 404, description = "Province not found")
    ),
    tag = "provinces"
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<ProvinceUpdate>,
) -> BusinessResult<Json<Province>> {
    Province::update(&state.db, id, data)
        .await
        .map(Json)
        .map_err(|e| write_error(e, Province::RESOURCE_NAME_SINGULAR, id))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Province ID")),
    responses(
        (status = 204, description = "Province and its subtree deleted"),
        (status = 404, description = "Province not found"),
        (status = 409, description = "Spray totals still reference a community in this province")
    ),
    tag = "provinces"
)]
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> BusinessResult<StatusCode> {
    Province::delete(&state.db, id)
        .await
        .map_err(|e| write_error(e, Province::RESOURCE_NAME_SINGULAR, id))?;
    tracing::info!(username = %user.username, province_id = %id, "Deleted province");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/districts",
    params(("id" = Uuid, Path, description = "Province ID")),
    responses(
        (status = 200, description = "Districts of the province", body = Vec<DistrictList>),
        (status = 404, description = "Province not found")
    ),
    tag = "provinces"
)]
pub async fn list_province_districts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> BusinessResult<Json<Vec<DistrictList>>> {
    let province = provinces::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| e.to_business_error(Province::RESOURCE_NAME_SINGULAR))?
        .ok_or_else(|| crate::not_found!(Province::RESOURCE_NAME_SINGULAR, id))?;

    let rows = districts::Entity::find()
        .filter(districts::Column::ProvinceId.eq(id))
        .order_by_asc(districts::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("district"))?;

    Ok(Json(
        rows.into_iter()
            .map(|model| {
                let mut district = DistrictList::from(model);
                district.province_name = Some(province.name.clone());
                district
            })
            .collect(),
    ))
}
