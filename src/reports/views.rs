use super::excel::{build_csv, build_workbook, filter_labels};
use super::models::{
    DetailedReport, ExportFormat, ExportParams, ProgressReport, ReportFilter, SummaryReport,
};
use super::services::{
    detailed_report, detailed_rows, load_report_data, progress_report, summary_report,
};
use crate::common::auth::{CurrentUser, MANAGERS, require_session};
use crate::common::errors::{BusinessError, BusinessResult};
use crate::common::state::AppState;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json, middleware};
use utoipa_axum::{router::OpenApiRouter, routes};

const RESOURCE: &str = "reports";
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(get_summary))
        .routes(routes!(get_detailed))
        .routes(routes!(get_progress))
        .routes(routes!(export))
        .layer(middleware::from_fn_with_state(state.clone(), require_session))
        .with_state(state.clone())
}

#[utoipa::path(
    get,
    path = "/summary",
    params(ReportFilter),
    responses(
        (status = 200, description = "Totals, geography tree, distributions and target progress", body = SummaryReport),
        (status = 403, description = "Reports are limited to admins and supervisors")
    ),
    tag = "reports"
)]
pub async fn get_summary(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<ReportFilter>,
) -> BusinessResult<Json<SummaryReport>> {
    user.require_role(MANAGERS, "read", RESOURCE)?;

    let data = load_report_data(&state.db, &filter).await?;
    Ok(Json(summary_report(filter, &data)))
}

#[utoipa::path(
    get,
    path = "/detailed",
    params(ReportFilter),
    responses(
        (status = 200, description = "One row per spray total with resolved names", body = DetailedReport),
        (status = 403, description = "Reports are limited to admins and supervisors")
    ),
    tag = "reports"
)]
pub async fn get_detailed(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<ReportFilter>,
) -> BusinessResult<Json<DetailedReport>> {
    user.require_role(MANAGERS, "read", RESOURCE)?;

    let data = load_report_data(&state.db, &filter).await?;
    Ok(Json(detailed_report(filter, &data)))
}

#[utoipa::path(
    get,
    path = "/progress",
    params(ReportFilter),
    responses(
        (status = 200, description = "Target progress and the daily cumulative series", body = ProgressReport),
        (status = 403, description = "Reports are limited to admins and supervisors")
    ),
    tag = "reports"
)]
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<ReportFilter>,
) -> BusinessResult<Json<ProgressReport>> {
    user.require_role(MANAGERS, "read", RESOURCE)?;

    let data = load_report_data(&state.db, &filter).await?;
    Ok(Json(progress_report(filter, &data)))
}

#[utoipa::path(
    get,
    path = "/export",
    params(ReportFilter, ExportParams),
    responses(
        (status = 200, description = "Workbook download, or CSV with format=csv", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 403, description = "Reports are limited to admins and supervisors")
    ),
    tag = "reports"
)]
pub async fn export(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<ReportFilter>,
    Query(params): Query<ExportParams>,
) -> BusinessResult<Response> {
    user.require_role(MANAGERS, "export", RESOURCE)?;

    let data = load_report_data(&state.db, &filter).await?;
    let rows = detailed_rows(&data);
    let stem = format!(
        "spray-report-{}",
        filter.year.map_or_else(|| "all".to_string(), |y| y.to_string())
    );
    let format = params.format.unwrap_or_default();

    let (content_type, filename, bytes) = match format {
        ExportFormat::Xlsx => {
            let labels = filter_labels(&filter, &data.lookups);
            let summary = summary_report(filter, &data);
            let bytes = build_workbook(&summary, &rows, &labels).map_err(|e| {
                BusinessError::InternalError {
                    message: format!("Failed to build workbook: {e}"),
                }
            })?;
            (XLSX_CONTENT_TYPE, format!("{stem}.xlsx"), bytes)
        }
        ExportFormat::Csv => {
            let bytes = build_csv(&rows).map_err(|e| BusinessError::InternalError {
                message: format!("Failed to build CSV: {e}"),
            })?;
            ("text/csv; charset=utf-8", format!("{stem}.csv"), bytes)
        }
    };

    tracing::info!(
        username = %user.username,
        rows = rows.len(),
        file = %filename,
        "Exported spray report"
    );

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
