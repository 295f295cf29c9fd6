//! Guards layered around the read handlers generated by crudcrate

use crate::common::auth::{AccessPolicy, require_role_for_method, require_session};
use crate::common::errors::{BusinessError, BusinessResult, DbErrorExt};
use crate::common::state::AppState;
use axum::body::to_bytes;
use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use crudcrate::models::FilterOptions;
use sea_orm::{DatabaseConnection, DbErr};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

/// Page size when a list request names no range
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Largest page a list request may ask for
pub const MAX_PAGE_SIZE: u64 = 1000;

const ERROR_BODY_LIMIT: usize = 64 * 1024;

fn check_page_size(field: &str, size: u64) -> BusinessResult<()> {
    if (1..=MAX_PAGE_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(crate::validation_error!(
            field,
            format!("must select between 1 and {MAX_PAGE_SIZE} rows")
        ))
    }
}

/// Offset and limit of a list request, read the way crudcrate's
/// `parse_pagination` reads them. Windows that would overflow the offset
/// arithmetic or exceed [`MAX_PAGE_SIZE`] are rejected.
pub fn list_window(params: &FilterOptions) -> BusinessResult<(u64, u64)> {
    if params.page.is_some() || params.per_page.is_some() {
        let per_page = params.per_page.unwrap_or(DEFAULT_PAGE_SIZE);
        check_page_size("per_page", per_page)?;
        let offset = params
            .page
            .unwrap_or(0)
            .checked_mul(per_page)
            .filter(|offset| offset.checked_add(per_page).is_some())
            .ok_or_else(|| crate::validation_error!("page", "is out of range"))?;
        return Ok((offset, per_page));
    }

    let Some(range) = params.range.as_deref() else {
        return Ok((0, DEFAULT_PAGE_SIZE));
    };
    let [start, end]: [u64; 2] = serde_json::from_str(range)
        .map_err(|_| crate::validation_error!("range", "must be a JSON array [start, end]"))?;
    if end < start {
        return Err(crate::validation_error!("range", "end must not be before start"));
    }
    let limit = (end - start).saturating_add(1);
    check_page_size("range", limit)?;
    if start.checked_add(limit).is_none() {
        return Err(crate::validation_error!("range", "is out of range"));
    }
    Ok((start, limit))
}

/// Rejects list queries the generated handlers cannot page safely
pub async fn check_list_window(request: Request, next: Next) -> Response {
    let checked = Query::<FilterOptions>::try_from_uri(request.uri())
        .map_err(|rejection| crate::validation_error!("query", rejection.body_text()))
        .and_then(|Query(params)| list_window(&params));
    if let Err(error) = checked {
        return error.into_response();
    }
    next.run(request).await
}

/// Rewrites the plain-text failures of the generated handlers into the
/// error envelope. Detail from 5xx bodies is logged, never returned.
pub async fn business_errors(
    State(resource): State<&'static str>,
    request: Request,
    next: Next,
) -> Response {
    let id = request
        .uri()
        .path()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();

    let response = next.run(request).await;
    let status = response.status();
    if status.is_success() {
        return response;
    }

    let body = to_bytes(response.into_body(), ERROR_BODY_LIMIT)
        .await
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();

    let error = match status {
        StatusCode::NOT_FOUND => crate::not_found!(resource, id),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            crate::validation_error!("request", body.trim_matches('"'))
        }
        _ => BusinessError::InternalError {
            message: format!("{resource} handler returned {status}: {body}"),
        },
    };
    error.into_response()
}

/// Maps a failed write on `id`, naming the record when it is gone
pub fn write_error(err: DbErr, resource: &str, id: Uuid) -> BusinessError {
    match err {
        DbErr::RecordNotFound(_) => crate::not_found!(resource, id),
        other => other.to_business_error(resource),
    }
}

/// Mounts the generated `reads` next to the hand-written `writes`. Both sit
/// behind a live session and the role `policy` for the request method.
pub fn guarded_router(
    state: &AppState,
    policy: AccessPolicy,
    resource: &'static str,
    reads: OpenApiRouter<DatabaseConnection>,
    writes: OpenApiRouter<AppState>,
) -> OpenApiRouter {
    let reads: OpenApiRouter = reads
        .with_state(state.db.clone())
        .layer(middleware::from_fn_with_state(resource, business_errors))
        .layer(middleware::from_fn(check_list_window));

    writes
        .with_state(state.clone())
        .merge(reads)
        .layer(middleware::from_fn_with_state(policy, require_role_for_method))
        .layer(middleware::from_fn_with_state(state.clone(), require_session))
}
