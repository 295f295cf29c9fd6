use crate::common::errors::{BusinessError, BusinessResult};
use crate::common::state::AppState;
use axum::Extension;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::Response;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "SUPERVISOR")]
    Supervisor,
    #[sea_orm(string_value = "SPRAYER")]
    Sprayer,
}

/// Roles allowed to call a route
pub const ALL_ROLES: &[Role] = &[Role::Admin, Role::Supervisor, Role::Sprayer];
pub const MANAGERS: &[Role] = &[Role::Admin, Role::Supervisor];
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => f.write_str("ADMIN"),
            Role::Supervisor => f.write_str("SUPERVISOR"),
            Role::Sprayer => f.write_str("SPRAYER"),
        }
    }
}

/// The user behind the session presented with a request. Inserted into the
/// request extensions by [`require_session`].
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    #[serde(skip)]
    pub session_id: Uuid,
}

impl CurrentUser {
    /// Rejects the request with 403 unless the user's role is in `allowed`
    pub fn require_role(&self, allowed: &[Role], action: &str, resource: &str) -> BusinessResult<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            tracing::warn!(
                user = %self.username,
                role = %self.role,
                "Denied {action} on {resource}"
            );
            Err(crate::forbidden!(action, resource))
        }
    }

    /// ADMIN and SUPERVISOR act on any record; SPRAYER only on their own
    pub fn is_privileged(&self) -> bool {
        MANAGERS.contains(&self.role)
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Roles allowed to read and to change one resource
#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    pub resource: &'static str,
    pub read: &'static [Role],
    pub write: &'static [Role],
}

impl AccessPolicy {
    /// Geography, actors and configurations: every role reads, ADMIN writes
    pub const fn reference_data(resource: &'static str) -> Self {
        Self {
            resource,
            read: ALL_ROLES,
            write: ADMIN_ONLY,
        }
    }

    pub const fn admin_only(resource: &'static str) -> Self {
        Self {
            resource,
            read: ADMIN_ONLY,
            write: ADMIN_ONLY,
        }
    }

    pub const fn all_roles(resource: &'static str) -> Self {
        Self {
            resource,
            read: ALL_ROLES,
            write: ALL_ROLES,
        }
    }

    /// Allowed roles and the action named in a 403, by HTTP method
    pub fn for_method(&self, method: &Method) -> (&'static [Role], &'static str) {
        match *method {
            Method::GET | Method::HEAD => (self.read, "read"),
            Method::POST => (self.write, "create"),
            Method::PUT | Method::PATCH => (self.write, "update"),
            Method::DELETE => (self.write, "delete"),
            _ => (self.write, "change"),
        }
    }
}

/// Middleware checking the session user's role against `policy`. Layered
/// inside [`require_session`], which provides the [`CurrentUser`].
pub async fn require_role_for_method(
    State(policy): State<AccessPolicy>,
    Extension(user): Extension<CurrentUser>,
    request: Request,
    next: Next,
) -> Result<Response, BusinessError> {
    let (allowed, action) = policy.for_method(request.method());
    user.require_role(allowed, action, policy.resource)?;
    Ok(next.run(request).await)
}

/// Middleware gating every protected route on a live session
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BusinessError> {
    let token = bearer_token(request.headers())
        .map(str::to_owned)
        .ok_or_else(|| BusinessError::Unauthorized {
            message: "Missing bearer token".to_string(),
        })?;

    let user = crate::users::services::resolve_session(&state.db, &token).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
