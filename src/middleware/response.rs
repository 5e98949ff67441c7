use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{ApiError, ErrorDetail};

const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Wrapper for API responses that automatically adds success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub count: Option<i64>,
    pub message: Option<String>,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            count: None,
            message: None,
            status_code: StatusCode::OK,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            status_code: StatusCode::CREATED,
            ..Self::success(data)
        }
    }

    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Envelope with only a message, e.g. after a delete
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            data: None,
            count: None,
            message: Some(message.into()),
            status_code: StatusCode::OK,
        }
    }

    /// Envelope with only a count
    pub fn count(count: i64) -> Self {
        Self {
            data: None,
            count: Some(count),
            message: None,
            status_code: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut envelope = Map::new();
        envelope.insert("success".to_string(), Value::Bool(true));

        if let Some(data) = &self.data {
            match serde_json::to_value(data) {
                Ok(value) => {
                    envelope.insert("data".to_string(), value);
                }
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return ApiError::internal(format!("response serialization: {}", e)).into_response();
                }
            }
        }
        if let Some(count) = self.count {
            envelope.insert("count".to_string(), json!(count));
        }
        if let Some(message) = self.message {
            envelope.insert("message".to_string(), Value::String(message));
        }

        (self.status_code, Json(Value::Object(envelope))).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Copies the `ErrorDetail` of a 5xx response into its JSON body as
/// `detail`. Only installed outside production.
pub async fn expose_error_detail(
    State(expose): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !expose || !response.status().is_server_error() {
        return response;
    }
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Could not buffer error body: {}", e);
            return Response::from_parts(parts, Body::empty());
        }
    };

    let body = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(mut map)) => {
            map.insert("detail".to_string(), Value::String(detail));
            parts.headers.remove(axum::http::header::CONTENT_LENGTH);
            parts
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            Body::from(Value::Object(map).to_string())
        }
        _ => Body::from(bytes),
    };
    Response::from_parts(parts, body)
}
