use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use std::fmt;

/// Application errors, each mapped onto one HTTP status
#[derive(Debug, Clone)]
pub enum BusinessError {
    /// Missing, unknown or expired session (401 Unauthorized)
    Unauthorized { message: String },
    /// Validation errors for user input (400 Bad Request)
    ValidationError { field: String, message: String },
    /// Resource not found (404 Not Found)
    NotFound { resource: String, id: String },
    /// Duplicate resource (409 Conflict)
    Duplicate { resource: String, field: String },
    /// Resource still referenced elsewhere (409 Conflict)
    Conflict { resource: String, message: String },
    /// Permission denied (403 Forbidden)
    Forbidden { action: String, resource: String },
    /// External service errors (502 Bad Gateway)
    ExternalServiceError { service: String, message: String },
    /// Generic application error (500 Internal Server Error)
    InternalError { message: String },
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusinessError::Unauthorized { message } => write!(f, "Unauthorized: {message}"),
            BusinessError::ValidationError { field, message } => {
                write!(f, "Validation error in field '{field}': {message}")
            }
            BusinessError::NotFound { resource, id } => {
                write!(f, "{resource} with id '{id}' not found")
            }
            BusinessError::Duplicate { resource, field } => {
                write!(f, "{resource} with this {field} already exists")
            }
            BusinessError::Conflict { resource, message } => {
                write!(f, "{resource} conflict: {message}")
            }
            BusinessError::Forbidden { action, resource } => {
                write!(f, "Not authorized to {action} {resource}")
            }
            BusinessError::ExternalServiceError { service, message } => {
                write!(f, "External service '{service}' error: {message}")
            }
            BusinessError::InternalError { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for BusinessError {}

impl BusinessError {
    /// Variant name used in the `type` field of the response body
    fn kind(&self) -> &'static str {
        match self {
            BusinessError::Unauthorized { .. } => "Unauthorized",
            BusinessError::ValidationError { .. } => "ValidationError",
            BusinessError::NotFound { .. } => "NotFound",
            BusinessError::Duplicate { .. } => "Duplicate",
            BusinessError::Conflict { .. } => "Conflict",
            BusinessError::Forbidden { .. } => "Forbidden",
            BusinessError::ExternalServiceError { .. } => "ExternalServiceError",
            BusinessError::InternalError { .. } => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            BusinessError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            BusinessError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            BusinessError::NotFound { .. } => StatusCode::NOT_FOUND,
            BusinessError::Duplicate { .. } | BusinessError::Conflict { .. } => {
                StatusCode::CONFLICT
            }
            BusinessError::Forbidden { .. } => StatusCode::FORBIDDEN,
            BusinessError::ExternalServiceError { .. } => StatusCode::BAD_GATEWAY,
            BusinessError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert `BusinessError` to HTTP responses
impl IntoResponse for BusinessError {
    fn into_response(self) -> Response {
        let (error_code, message) = match &self {
            BusinessError::Unauthorized { message } => ("UNAUTHORIZED", message.clone()),
            BusinessError::ValidationError { field, message } => (
                "VALIDATION_ERROR",
                format!("Validation failed for field '{field}': {message}"),
            ),
            BusinessError::NotFound { resource, id } => (
                "RESOURCE_NOT_FOUND",
                format!("{resource} with id '{id}' not found"),
            ),
            BusinessError::Duplicate { resource, field } => (
                "DUPLICATE_RESOURCE",
                format!("{resource} with this {field} already exists"),
            ),
            BusinessError::Conflict { resource, message } => {
                ("CONFLICT", format!("{resource}: {message}"))
            }
            BusinessError::Forbidden { action, resource } => (
                "FORBIDDEN",
                format!("Not authorized to {action} {resource}"),
            ),
            BusinessError::ExternalServiceError { service, message } => {
                tracing::error!(service = %service, "External service error: {message}");
                (
                    "EXTERNAL_SERVICE_ERROR",
                    format!("External service '{service}' is unavailable"),
                )
            }
            BusinessError::InternalError { message } => {
                tracing::error!("Internal error: {message}");
                ("INTERNAL_ERROR", "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
                "type": self.kind()
            }
        }));

        (self.status(), body).into_response()
    }
}

/// Maps database errors onto business errors
pub struct ErrorMapper;

impl ErrorMapper {
    /// Map `DbErr` to appropriate HTTP responses with business context
    pub fn map_db_error(err: DbErr, context: &str) -> BusinessError {
        // Constraint violations are reported the same way by every backend
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                return BusinessError::Duplicate {
                    resource: Self::extract_resource_from_context(context),
                    field: Self::extract_field_from_constraint(&msg),
                };
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                return BusinessError::Conflict {
                    resource: Self::extract_resource_from_context(context),
                    message: "the record is referenced by, or references, another record"
                        .to_string(),
                };
            }
            _ => {}
        }

        match err {
            DbErr::RecordNotFound(msg) => {
                let resource = Self::extract_resource_from_context(context);
                let id = Self::extract_id_from_message(&msg);
                BusinessError::NotFound { resource, id }
            }
            DbErr::Custom(msg) => {
                if msg.starts_with("Validation failed:") {
                    let field = Self::extract_field_from_validation(&msg);
                    let message = msg.replace("Validation failed:", "").trim().to_string();
                    BusinessError::ValidationError { field, message }
                } else if msg.contains("already exists") || msg.contains("duplicate") {
                    let resource = Self::extract_resource_from_context(context);
                    let field = Self::extract_field_from_constraint(&msg);
                    BusinessError::Duplicate { resource, field }
                } else {
                    BusinessError::InternalError { message: msg }
                }
            }
            DbErr::Conn(conn_err) => BusinessError::ExternalServiceError {
                service: "database".to_string(),
                message: conn_err.to_string(),
            },
            DbErr::ConnectionAcquire(acquire_err) => BusinessError::ExternalServiceError {
                service: "database".to_string(),
                message: acquire_err.to_string(),
            },
            _ => BusinessError::InternalError {
                message: format!("{context}: {err}"),
            },
        }
    }

    /// Resource name from a context like `spray_total`
    fn extract_resource_from_context(context: &str) -> String {
        context.replace('_', " ")
    }

    /// Helper to extract ID from error messages
    fn extract_id_from_message(msg: &str) -> String {
        // Look for patterns like "id 'value'"
        if let Some(start_pos) = msg.find(" id '") {
            let after_id = &msg[start_pos + 5..];
            if let Some(end_pos) = after_id.find('\'') {
                return after_id[..end_pos].to_string();
            }
        }

        // Fallback: a UUID anywhere in the message
        msg.split_whitespace()
            .find_map(|word| {
                let cleaned = word.trim_matches('\'').trim_matches('"');
                uuid::Uuid::parse_str(cleaned)
                    .ok()
                    .map(|_| cleaned.to_string())
            })
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Field name from messages like "Validation failed: name must not be empty"
    fn extract_field_from_validation(msg: &str) -> String {
        msg.split(':')
            .nth(1)
            .and_then(|part| part.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string()
    }

    /// Helper to extract field from constraint violation
    fn extract_field_from_constraint(msg: &str) -> String {
        if msg.contains("username") {
            "username".to_string()
        } else if msg.contains("token") {
            "token".to_string()
        } else if msg.contains("name") {
            "name".to_string()
        } else {
            "field".to_string()
        }
    }
}

/// Convenience macros for creating business errors
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $message:expr) => {
        $crate::common::errors::BusinessError::ValidationError {
            field: $field.to_string(),
            message: $message.to_string(),
        }
    };
}

#[macro_export]
macro_rules! not_found {
    ($resource:expr, $id:expr) => {
        $crate::common::errors::BusinessError::NotFound {
            resource: $resource.to_string(),
            id: $id.to_string(),
        }
    };
}

#[macro_export]
macro_rules! forbidden {
    ($action:expr, $resource:expr) => {
        $crate::common::errors::BusinessError::Forbidden {
            action: $action.to_string(),
            resource: $resource.to_string(),
        }
    };
}

/// Builds the `DbErr` that model hooks return for rejected input. The first
/// word of `message` is reported as the offending field.
pub fn validation_db_err(message: impl fmt::Display) -> DbErr {
    DbErr::Custom(format!("Validation failed: {message}"))
}

/// Extension trait to add business error conversion to `DbErr`
pub trait DbErrorExt {
    fn to_business_error(self, context: &str) -> BusinessError;
}

impl DbErrorExt for DbErr {
    fn to_business_error(self, context: &str) -> BusinessError {
        ErrorMapper::map_db_error(self, context)
    }
}

/// Result type alias for business operations
pub type BusinessResult<T> = Result<T, BusinessError>;
