pub mod auth_service;
pub mod error;
pub mod fields;
pub mod history_service;
pub mod reference_service;
pub mod worker_service;

pub use auth_service::{AuthService, LoginRequest, LoginSession, RegisterRequest};
pub use error::{ConflictKind, FieldErrors, Resource, ServiceError, ServiceResult};
pub use history_service::{HistoryController, HistoryPayload};
pub use reference_service::ReferenceController;
pub use worker_service::{WorkerController, WorkerPayload};
