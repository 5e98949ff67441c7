// HTTP API Error Types
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::database::DatabaseError;
use crate::services::{ServiceError, ConflictKind};

/// Server-side detail of an internal failure, attached to the response so
/// that non-production deployments can surface it.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    ValidationError {
        message: String,
        field_errors: Option<BTreeMap<String, String>>,
    },
    FieldRequired(String),
    MissingFields(Vec<String>),
    InvalidJson(String),

    // 401 Unauthorized
    TokenMissing(String),
    InvalidCredentials(String),

    // 403 Forbidden
    TokenInvalid(String),
    InsufficientPermissions(String),
    InvalidSpecialPassword(String),

    // 404 Not Found
    NotFound { code: &'static str, message: String },
    RouteNotFound { path: String },

    // 409 Conflict
    Conflict { code: &'static str, message: String },

    // 500 Internal Server Error
    InternalServerError { message: String, detail: Option<String> },

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError { .. }
            | ApiError::FieldRequired(_)
            | ApiError::MissingFields(_)
            | ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::TokenMissing(_) | ApiError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            ApiError::TokenInvalid(_)
            | ApiError::InsufficientPermissions(_)
            | ApiError::InvalidSpecialPassword(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } | ApiError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::ValidationError { message, .. } => message,
            ApiError::FieldRequired(msg) => msg,
            ApiError::MissingFields(_) => "Missing required fields",
            ApiError::InvalidJson(msg) => msg,
            ApiError::TokenMissing(msg) => msg,
            ApiError::InvalidCredentials(msg) => msg,
            ApiError::TokenInvalid(msg) => msg,
            ApiError::InsufficientPermissions(msg) => msg,
            ApiError::InvalidSpecialPassword(msg) => msg,
            ApiError::NotFound { message, .. } => message,
            ApiError::RouteNotFound { .. } => "Route not found",
            ApiError::Conflict { message, .. } => message,
            ApiError::InternalServerError { message, .. } => message,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::FieldRequired(_) => "FIELD_REQUIRED",
            ApiError::MissingFields(_) => "MISSING_FIELDS",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::TokenMissing(_) => "TOKEN_MISSING",
            ApiError::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            ApiError::TokenInvalid(_) => "TOKEN_INVALID",
            ApiError::InsufficientPermissions(_) => "INSUFFICIENT_PERMISSIONS",
            ApiError::InvalidSpecialPassword(_) => "INVALID_SPECIAL_PASSWORD",
            ApiError::NotFound { code, .. } => *code,
            ApiError::RouteNotFound { .. } => "ROUTE_NOT_FOUND",
            ApiError::Conflict { code, .. } => *code,
            ApiError::InternalServerError { .. } => "INTERNAL_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        match self {
            ApiError::ValidationError {
                field_errors: Some(field_errors),
                ..
            } => {
                response["field_errors"] = json!(field_errors);
            }
            ApiError::MissingFields(fields) => {
                response["missingFields"] = json!(fields);
            }
            ApiError::RouteNotFound { path } => {
                response["path"] = json!(path);
            }
            _ => {}
        }

        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<BTreeMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn token_missing() -> Self {
        ApiError::TokenMissing("Access token is missing".to_string())
    }

    pub fn token_invalid() -> Self {
        ApiError::TokenInvalid("Invalid or expired token".to_string())
    }

    pub fn insufficient_permissions() -> Self {
        ApiError::InsufficientPermissions("Insufficient permissions".to_string())
    }

    pub fn route_not_found(path: impl Into<String>) -> Self {
        ApiError::RouteNotFound { path: path.into() }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Conflict {
            code,
            message: message.into(),
        }
    }

    /// Generic client message; `detail` is only logged and, outside
    /// production, echoed back.
    pub fn internal(detail: impl Into<String>) -> Self {
        ApiError::InternalServerError {
            message: "Internal server error".to_string(),
            detail: Some(detail.into()),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::PoolTimedOut => {
                tracing::warn!("Database pool exhausted");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::ForeignKeyViolation(_) => ApiError::conflict(
                ConflictKind::Referenced.code(),
                ConflictKind::Referenced.message(),
            ),
            DatabaseError::UniqueViolation(constraint) => {
                tracing::warn!("Unhandled unique violation on {}", constraint);
                ApiError::conflict("CONFLICT", "Record conflicts with an existing record")
            }
            other => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Database error: {}", other);
                ApiError::internal(other.to_string())
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::FieldRequired(field) => {
                ApiError::FieldRequired(format!("Field \"{}\" is required", field))
            }
            ServiceError::Validation {
                message,
                field_errors,
            } => {
                let field_errors = (!field_errors.is_empty()).then_some(field_errors);
                ApiError::validation_error(message, field_errors)
            }
            ServiceError::MissingFields(fields) => {
                ApiError::MissingFields(fields.into_iter().map(str::to_string).collect())
            }
            ServiceError::NotFound(resource) => ApiError::NotFound {
                code: resource.code(),
                message: resource.message().to_string(),
            },
            ServiceError::Conflict(kind) => ApiError::conflict(kind.code(), kind.message()),
            ServiceError::InvalidCredentials => {
                ApiError::InvalidCredentials("Invalid username or password".to_string())
            }
            ServiceError::SpecialPasswordRejected(role) => ApiError::InvalidSpecialPassword(
                format!("Invalid special password for role {}", role),
            ),
            ServiceError::Database(db_err) => db_err.into(),
            other => {
                tracing::error!("Request failed: {}", other);
                ApiError::internal(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status_code(), Json(self.to_json())).into_response();
        if let ApiError::InternalServerError {
            detail: Some(detail),
            ..
        } = self
        {
            response.extensions_mut().insert(ErrorDetail(detail));
        }
        response
    }
}
