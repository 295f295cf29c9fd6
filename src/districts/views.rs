use super::models::{
    self as districts, District, DistrictCreate, DistrictUpdate, get_all_handler,
    get_one_handler, __path_get_all_handler, __path_get_one_handler};
use crate::common::auth::{AccessPolicy, CurrentUser};
use crate::common::crud::{guarded_router, write_error};
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::common::state::AppState;
use crate::localities::models::{self as localities, LocalityList};
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
        AccessPolicy::reference_data(District::RESOURCE_NAME_PLURAL),
        District::RESOURCE_NAME_SINGULAR,
        OpenApiRouter::new()
            .routes(routes!(get_one_handler))
            .routes(routes!(get_all_handler)),
        OpenApiRouter::new()
            .routes(routes!(create))
            .routes(routes!(update, delete))
            .routes(routes!(list_district_localities)),
    )
}

#[utoipa::path(
    post,
    path = "/",
    request_body = DistrictCreate,
    responses(
        (status = 201, body = District),
        (status = 400, description = "Invalid input or unknown province"),
        (status = 409, description = "The province already has a district with this name")
    ),
    tag = "districts"
)]
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<DistrictCreate>,
) -> BusinessResult<(StatusCode, Json<District>)> {
    let created = District::create(&state.db, data)
        .await
        .map_err(|e| e.to_business_error(District::RESOURCE_NAME_SINGULAR))?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "District ID")),
    request_body = DistrictUpdate,
    responses(
        (status = 200, body = District),
        (status = 400, description = "Invalid input or unknown province"),
        (status = 404, description = "District not found")
    ),
    tag = "districts"
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<DistrictUpdate>,
) -> BusinessResult<Json<District>> {
    District::update(&state.db, id, data)
        .await
        .map(Json)
        .map_err(|e| write_error(e, District::RESOURCE_NAME_SINGULAR, id))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "District ID")),
    responses(
        (status = 204, description = "District and its subtree deleted"),
        (status = 404, description = "District not found"),
        (status = 409, description = "Spray totals still reference a community in this district")
    ),
    tag = "districts"
)]
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> BusinessResult<StatusCode> {
    District::delete(&state.db, id)
        .await
        .map_err(|e| write_error(e, District::RESOURCE_NAME_SINGULAR, id))?;
    tracing::info!(username = %user.username, district_id = %id, "Deleted district");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/localities",
    params(("id" = Uuid, Path, description = "District ID")),
    responses(
        (status = 200, description = "Localities of the district", body = Vec<LocalityList>),
        (status = 404, description = "District not found")
    ),
    tag = "districts"
)]
pub async fn list_district_localities(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> BusinessResult<Json<Vec<LocalityList>>> {
    let district = districts::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| e.to_business_error(District::RESOURCE_NAME_SINGULAR))?
        .ok_or_else(|| crate::not_found!(District::RESOURCE_NAME_SINGULAR, id))?;

    let rows = localities::Entity::find()
        .filter(localities::Column::DistrictId.eq(id))
        .order_by_asc(localities::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("locality"))?;

    Ok(Json(
        rows.into_iter()
            .map(|model| {
                let mut locality = LocalityList::from(model);
                locality.district_name = Some(district.name.clone());
                locality
            })
            .collect(),
    ))
}
