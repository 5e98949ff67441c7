// handlers/public/auth/login.rs - POST /login handler

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::extract::ApiJson;
use crate::services::LoginRequest;
use crate::state::AppState;

/**
 * POST /login - Authenticate user and receive JWT token
 *
 * Expected Input:
 * ```json
 * { "username": "alice", "password": "Secret123" }
 * ```
 *
 * Expected Output (Success):
 * ```json
 * {
 *   "success": true,
 *   "token": "eyJhbGciOiJIUzI1NiI...",
 *   "role": "editor",
 *   "username": "alice",
 *   "user": { "id": 1, "username": "alice", "role": "editor" }
 * }
 * ```
 *
 * Unknown users and wrong passwords both answer 401 INVALID_CREDENTIALS.
 */
pub async fn login_post(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let session = state.auth.login(request).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "token": session.token,
            "role": session.user.role,
            "username": session.user.username,
            "user": session.user,
        })),
    ))
}
