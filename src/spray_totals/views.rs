use super::models::{BulkDeleteResult, SprayTotal, SprayTotalCreate, SprayTotalUpdate};
use super::services::{
    bulk_soft_delete, create_spray_total, soft_delete_spray_total, update_spray_total,
};
use crate::common::auth::{AccessPolicy, CurrentUser, MANAGERS};
use crate::common::crud::guarded_router;
use crate::common::errors::BusinessResult;
use crate::common::state::AppState;
use axum::Extension;
use crudcrate::{CRUDResource, crud_handlers};
use utoipa_axum::{router::OpenApiRouter, routes};
use sea_orm::ConnectionTrait;
use uuid::Uuid;

crud_handlers!(SprayTotal, SprayTotalUpdate, SprayTotalCreate);

pub fn router(state: &AppState) -> OpenApiRouter {
    guarded_router(
        state,
        AccessPolicy::all_roles(SprayTotal::RESOURCE_NAME_PLURAL),
        SprayTotal::RESOURCE_NAME_SINGULAR,
        OpenApiRouter::new()
            .routes(routes!(get_one_handler))
            .routes(routes!(get_all_handler)),
        OpenApiRouter::new()
            .routes(routes!(create, bulk_delete))
            .routes(routes!(update, delete)),
    )
}

#[utoipa::path(
    post,
    path = "/",
    request_body = SprayTotalCreate,
    responses(
        (status = 201, body = SprayTotal),
        (status = 400, description = "Counts do not add up or a reference is unknown")
    ),
    tag = "spray-totals"
)]
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<SprayTotalCreate>,
) -> BusinessResult<(StatusCode, Json<SprayTotal>)> {
    let created = create_spray_total(&state.db, &user, data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Spray total ID")),
    request_body = SprayTotalUpdate,
    responses(
        (status = 200, body = SprayTotal),
        (status = 400, description = "Counts do not add up or a reference is unknown"),
        (status = 403, description = "Sprayers may only update their own records"),
        (status = 404, description = "Spray total not found or deleted")
    ),
    tag = "spray-totals"
)]
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(data): Json<SprayTotalUpdate>,
) -> BusinessResult<Json<SprayTotal>> {
    update_spray_total(&state.db, &user, id, data).await.map(Json)
}

#[utoipa::path(
    delete,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Spray total ID")),
    responses(
        (status = 204, description = "Spray total marked as deleted"),
        (status = 400, description = "Completed spray totals cannot be deleted"),
        (status = 403, description = "Only admins and supervisors delete spray totals"),
        (status = 404, description = "Spray total not found or already deleted")
    ),
    tag = "spray-totals"
)]
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> BusinessResult<StatusCode> {
    user.require_role(MANAGERS, "delete", SprayTotal::RESOURCE_NAME_PLURAL)?;

    soft_delete_spray_total(&state.db, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/",
    request_body = Vec<Uuid>,
    responses(
        (status = 200, description = "Deleted ids and per-id failures", body = BulkDeleteResult),
        (status = 403, description = "Only admins and supervisors delete spray totals")
    ),
    tag = "spray-totals"
)]
pub async fn bulk_delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(ids): Json<Vec<Uuid>>,
) -> BusinessResult<Json<BulkDeleteResult>> {
    user.require_role(MANAGERS, "delete", SprayTotal::RESOURCE_NAME_PLURAL)?;

    let result = bulk_soft_delete(&state.db, &user, ids).await;
    tracing::info!(
        username = %user.username,
        deleted = result.deleted.len(),
        failed = result.failed.len(),
        "Bulk spray total delete"
    );
    Ok(Json(result))
}
