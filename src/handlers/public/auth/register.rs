// handlers/public/auth/register.rs - POST /register handler

use axum::extract::State;

use crate::database::models::UserProfile;
use crate::handlers::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::RegisterRequest;
use crate::state::AppState;

/**
 * POST /register - Create an account
 *
 * Expected Input:
 * ```json
 * {
 *   "username": "alice",            // 3-50 chars, letters, digits, underscore
 *   "password": "Secret123",        // 8+ chars with lower, upper and digit
 *   "role": "editor",               // admin | editor | user
 *   "specialPassword": "..."        // required for admin and editor
 * }
 * ```
 *
 * Responds 201 with `{id, username, role}`; 400 on validation failures,
 * 403 INVALID_SPECIAL_PASSWORD, 409 USER_ALREADY_EXISTS.
 */
pub async fn register_post(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<UserProfile> {
    let user = state.auth.register(request).await?;
    Ok(ApiResponse::created(user).with_message("User registered successfully"))
}
