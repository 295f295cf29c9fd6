use super::models::{LoginRequest, LoginResponse, User, UserCreate, UserUpdate};
use super::services;
use crate::common::auth::{AccessPolicy, CurrentUser, require_session};
use crate::common::crud::guarded_router;
use crate::common::errors::BusinessResult;
use crate::common::state::AppState;
use axum::{Extension, middleware};
use crudcrate::{CRUDResource, crud_handlers};
use utoipa_axum::{router::OpenApiRouter, routes};
use sea_orm::ConnectionTrait;
use uuid::Uuid;

crud_handlers!(User, UserUpdate, UserCreate);

/// `/api/auth`: login is public, logout and me need a session
pub fn auth_router(state: &AppState) -> OpenApiRouter {
    let protected = OpenApiRouter::new()
        .routes(routes!(logout))
        .routes(routes!(me))
        .layer(middleware::from_fn_with_state(state.clone(), require_session));

    OpenApiRouter::new()
        .routes(routes!(login))
        .merge(protected)
        .with_state(state.clone())
}

/// `/api/users`, ADMIN only
pub fn router(state: &AppState) -> OpenApiRouter {
    guarded_router(
        state,
        AccessPolicy::admin_only(User::RESOURCE_NAME_PLURAL),
        User::RESOURCE_NAME_SINGULAR,
        OpenApiRouter::new()
            .routes(routes!(get_one_handler))
            .routes(routes!(get_all_handler)),
        OpenApiRouter::new()
            .routes(routes!(create_user))
            .routes(routes!(update_user, delete_user)),
    )
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Wrong username or password")
    ),
    security(()),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> BusinessResult<Json<LoginResponse>> {
    services::login(&state.db, &state.config, request)
        .await
        .map(Json)
}

#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 204, description = "Session revoked")),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> BusinessResult<StatusCode> {
    services::revoke_session(&state.db, user.session_id).await?;
    tracing::info!(username = %user.username, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "The session user", body = CurrentUser)),
    tag = "auth"
)]
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<CurrentUser> {
    Json(user)
}

#[utoipa::path(
    post,
    path = "/",
    request_body = UserCreate,
    responses(
        (status = 201, body = User),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already taken")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(data): Json<UserCreate>,
) -> BusinessResult<(StatusCode, Json<User>)> {
    let created = services::create_user(&state.db, data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UserUpdate,
    responses(
        (status = 200, body = User),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<UserUpdate>,
) -> BusinessResult<Json<User>> {
    services::update_user(&state.db, id, data).await.map(Json)
}

#[utoipa::path(
    delete,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Attempt to delete your own account"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> BusinessResult<StatusCode> {
    services::delete_user(&state.db, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
