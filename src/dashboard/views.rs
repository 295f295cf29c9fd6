use super::models::{Dashboard, DashboardParams};
use crate::common::auth::{ALL_ROLES, CurrentUser, require_session};
use crate::common::errors::BusinessResult;
use crate::common::state::AppState;
use crate::reports::models::ReportFilter;
use crate::reports::services::load_report_data;
use axum::extract::{Query, State};
use axum::{Extension, Json, middleware};
use chrono::{Datelike, Utc};
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(get_dashboard))
        .layer(middleware::from_fn_with_state(state.clone(), require_session))
        .with_state(state.clone())
}

#[utoipa::path(
    get,
    path = "/",
    params(DashboardParams),
    responses((status = 200, description = "Headline campaign figures for one year", body = Dashboard)),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<DashboardParams>,
) -> BusinessResult<Json<Dashboard>> {
    user.require_role(ALL_ROLES, "read", "dashboard")?;

    let year = params.year.unwrap_or_else(|| Utc::now().year());
    let filter = ReportFilter {
        year: Some(year),
        ..ReportFilter::default()
    };
    let data = load_report_data(&state.db, &filter).await?;
    Ok(Json(Dashboard::build(year, &data)))
}
