use super::models::{self as users, LoginRequest, LoginResponse, User, UserCreate, UserUpdate};
use super::sessions;
use crate::common::auth::{CurrentUser, Role};
use crate::common::errors::{BusinessError, BusinessResult, DbErrorExt};
use crate::config::Config;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use crudcrate::{CRUDResource, traits::MergeIntoActiveModel};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

pub const MIN_PASSWORD_LENGTH: usize = 8;

fn invalid_credentials() -> BusinessError {
    BusinessError::Unauthorized {
        message: "Invalid username or password".to_string(),
    }
}

fn invalid_session() -> BusinessError {
    BusinessError::Unauthorized {
        message: "Invalid or expired session".to_string(),
    }
}

pub fn hash_password(password: &str) -> BusinessResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| BusinessError::InternalError {
            message: format!("Password hashing failed: {e}"),
        })
}

/// False for malformed hashes as well as wrong passwords
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Argon2 is CPU bound, keep it off the async workers
async fn hash_password_blocking(password: String) -> BusinessResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| BusinessError::InternalError {
            message: format!("Password hashing task failed: {e}"),
        })?
}

async fn verify_password_blocking(password: String, hash: String) -> BusinessResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| BusinessError::InternalError {
            message: format!("Password verification task failed: {e}"),
        })
}

/// 32 random bytes, URL-safe base64 without padding
pub fn generate_token() -> String {
    URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>())
}

fn validate_password(password: &str) -> BusinessResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(crate::validation_error!(
            "password",
            format!("must be at least {MIN_PASSWORD_LENGTH} characters")
        ));
    }
    Ok(())
}

fn required_text(field: &str, value: &str) -> BusinessResult<()> {
    if value.trim().is_empty() {
        return Err(crate::validation_error!(field, "must not be empty"));
    }
    Ok(())
}

pub async fn issue_session(
    db: &DatabaseConnection,
    user_id: Uuid,
    ttl_hours: i64,
) -> Result<sessions::Model, DbErr> {
    let now = Utc::now();
    sessions::ActiveModel {
        id: Set(Uuid::new_v4()),
        token: Set(generate_token()),
        user_id: Set(user_id),
        created_at: Set(now),
        expires_at: Set(now + Duration::hours(ttl_hours)),
    }
    .insert(db)
    .await
}

/// Resolves a bearer token to its user; unknown, expired and inactive all
/// answer 401 without saying which
pub async fn resolve_session(db: &DatabaseConnection, token: &str) -> BusinessResult<CurrentUser> {
    let (session, user) = sessions::Entity::find()
        .filter(sessions::Column::Token.eq(token))
        .find_also_related(users::Entity)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("session"))?
        .ok_or_else(invalid_session)?;

    if session.is_expired() {
        sessions::Entity::delete_by_id(session.id)
            .exec(db)
            .await
            .map_err(|e| e.to_business_error("session"))?;
        return Err(invalid_session());
    }

    let user = user.filter(|u| u.is_active).ok_or_else(invalid_session)?;

    Ok(CurrentUser {
        id: user.id,
        username: user.username,
        full_name: user.full_name,
        role: user.role,
        session_id: session.id,
    })
}

pub async fn revoke_session(db: &DatabaseConnection, session_id: Uuid) -> BusinessResult<()> {
    sessions::Entity::delete_by_id(session_id)
        .exec(db)
        .await
        .map_err(|e| e.to_business_error("session"))?;
    Ok(())
}

pub async fn login(
    db: &DatabaseConnection,
    config: &Config,
    request: LoginRequest,
) -> BusinessResult<LoginResponse> {
    let user = users::Entity::find()
        .filter(users::Column::Username.eq(request.username.trim()))
        .one(db)
        .await
        .map_err(|e| e.to_business_error("user"))?;

    let Some(user) = user.filter(|u| u.is_active) else {
        tracing::info!(username = %request.username.trim(), "Rejected login for unknown or inactive user");
        return Err(invalid_credentials());
    };

    if !verify_password_blocking(request.password, user.password_hash.clone()).await? {
        tracing::info!(username = %user.username, "Rejected login with wrong password");
        return Err(invalid_credentials());
    }

    // Expired sessions are only ever read to be rejected
    sessions::Entity::delete_many()
        .filter(sessions::Column::ExpiresAt.lt(Utc::now()))
        .exec(db)
        .await
        .map_err(|e| e.to_business_error("session"))?;

    let session = issue_session(db, user.id, config.session_ttl_hours)
        .await
        .map_err(|e| e.to_business_error("session"))?;

    tracing::info!(username = %user.username, role = %user.role, "User logged in");

    Ok(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: CurrentUser {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            role: user.role,
            session_id: session.id,
        },
    })
}

pub async fn create_user(db: &DatabaseConnection, data: UserCreate) -> BusinessResult<User> {
    required_text("username", &data.username)?;
    required_text("full_name", &data.full_name)?;
    validate_password(&data.password)?;

    let password_hash = hash_password_blocking(data.password.clone()).await?;
    let mut active: users::ActiveModel = data.into();
    active.password_hash = Set(password_hash);

    let user = active
        .insert(db)
        .await
        .map_err(|e| e.to_business_error(User::RESOURCE_NAME_SINGULAR))?;

    tracing::info!(username = %user.username, role = %user.role, "Created user");
    Ok(user.into())
}

pub async fn update_user(
    db: &DatabaseConnection,
    id: Uuid,
    data: UserUpdate,
) -> BusinessResult<User> {
    let existing = users::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error(User::RESOURCE_NAME_SINGULAR))?
        .ok_or_else(|| crate::not_found!(User::RESOURCE_NAME_SINGULAR, id))?;

    if let Some(full_name) = &data.full_name {
        required_text("full_name", full_name)?;
    }
    let new_password = data.password.clone();
    let mut active = data
        .merge_into_activemodel(existing.into_active_model())
        .map_err(|e| e.to_business_error(User::RESOURCE_NAME_SINGULAR))?;
    let password_changed = new_password.is_some();
    if let Some(password) = new_password {
        validate_password(&password)?;
        active.password_hash = Set(hash_password_blocking(password).await?);
    }

    let user = active
        .update(db)
        .await
        .map_err(|e| e.to_business_error(User::RESOURCE_NAME_SINGULAR))?;

    // A new password or a deactivation ends every open session
    if password_changed || !user.is_active {
        sessions::Entity::delete_many()
            .filter(sessions::Column::UserId.eq(user.id))
            .exec(db)
            .await
            .map_err(|e| e.to_business_error("session"))?;
    }

    Ok(user.into())
}

pub async fn delete_user(
    db: &DatabaseConnection,
    current: &CurrentUser,
    id: Uuid,
) -> BusinessResult<()> {
    if current.id == id {
        return Err(crate::validation_error!(
            "id",
            "you cannot delete your own account"
        ));
    }

    let result = users::Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| e.to_business_error("user"))?;

    if result.rows_affected == 0 {
        return Err(crate::not_found!("user", id));
    }
    tracing::info!(deleted_by = %current.username, user_id = %id, "Deleted user");
    Ok(())
}

/// Creates the first ADMIN from `BOOTSTRAP_ADMIN_*` when no user exists yet
pub async fn ensure_bootstrap_admin(
    db: &DatabaseConnection,
    config: &Config,
) -> BusinessResult<Option<User>> {
    let (Some(username), Some(password)) = (
        config.bootstrap_admin_username.as_deref(),
        config.bootstrap_admin_password.as_deref(),
    ) else {
        return Ok(None);
    };

    let existing = users::Entity::find()
        .count(db)
        .await
        .map_err(|e| e.to_business_error("user"))?;
    if existing > 0 {
        return Ok(None);
    }

    let admin = create_user(
        db,
        UserCreate {
            username: username.to_string(),
            full_name: "Administrator".to_string(),
            password: password.to_string(),
            role: Role::Admin,
            is_active: true,
        },
    )
    .await?;

    tracing::info!(username = %admin.username, "Created bootstrap administrator");
    Ok(Some(admin))
}
