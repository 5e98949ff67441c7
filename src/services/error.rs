use std::collections::BTreeMap;
use thiserror::Error;

use crate::auth::{PasswordError, Role, TokenError};
use crate::database::DatabaseError;

/// Entity a lookup failed to find. Each maps to its own client code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Record,
    Worker,
    Action,
    History,
    User,
}

impl Resource {
    pub fn code(&self) -> &'static str {
        match self {
            Resource::Record => "RECORD_NOT_FOUND",
            Resource::Worker => "WORKER_NOT_FOUND",
            Resource::Action => "ACTION_NOT_FOUND",
            Resource::History => "HISTORY_NOT_FOUND",
            Resource::User => "USER_NOT_FOUND",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Resource::Record => "Record not found",
            Resource::Worker => "Worker not found",
            Resource::Action => "Action not found",
            Resource::History => "History record not found",
            Resource::User => "User not found",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    DuplicateName,
    Referenced,
    UserExists,
}

impl ConflictKind {
    pub fn code(&self) -> &'static str {
        match self {
            ConflictKind::DuplicateName => "DUPLICATE_NAME",
            ConflictKind::Referenced => "FOREIGN_KEY_CONSTRAINT",
            ConflictKind::UserExists => "USER_ALREADY_EXISTS",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ConflictKind::DuplicateName => "A record with this name already exists",
            ConflictKind::Referenced => "Cannot delete the record: it is referenced elsewhere",
            ConflictKind::UserExists => "A user with this username already exists",
        }
    }
}

/// Controller-level failures. Client-facing variants carry everything the
/// HTTP layer needs; the wrapped lower-layer errors are internal.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Field \"{0}\" is required")]
    FieldRequired(&'static str),

    #[error("{message}")]
    Validation {
        message: String,
        field_errors: BTreeMap<String, String>,
    },

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("{}", .0.message())]
    NotFound(Resource),

    #[error("{}", .0.message())]
    Conflict(ConflictKind),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid special password for role {0}")]
    SpecialPasswordRejected(Role),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    /// Single-field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = BTreeMap::new();
        field_errors.insert(field.to_string(), message.clone());
        ServiceError::Validation {
            message,
            field_errors,
        }
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServiceError::Task(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Collects per-field messages, then fails once with all of them.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    /// Unwraps a parsed field, recording its error message on failure.
    pub fn check<T>(&mut self, field: &str, result: Result<Option<T>, &'static str>) -> Option<T> {
        result.unwrap_or_else(|message| {
            self.add(field, message);
            None
        })
    }

    pub fn into_result(self, message: &str) -> ServiceResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation {
                message: message.to_string(),
                field_errors: self.errors,
            })
        }
    }
}
