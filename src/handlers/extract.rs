// handlers/extract.rs - Request extractors shared by all handlers

use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON body whose rejections render as `INVALID_JSON` in the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Parses a `:id` path segment. Ids are positive integers.
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => {
            let mut field_errors = std::collections::BTreeMap::new();
            field_errors.insert("id".to_string(), "ID must be a positive integer".to_string());
            Err(ApiError::validation_error("Invalid ID", Some(field_errors)))
        }
    }
}
