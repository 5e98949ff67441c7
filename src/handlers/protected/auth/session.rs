// handlers/protected/auth/session.rs - Current identity endpoints

use axum::extract::{Extension, State};

use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /me - Account of the token holder, read from the store
pub async fn me_get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<UserProfile> {
    let user = state.auth.current_user(auth_user.id).await?;
    Ok(ApiResponse::success(user))
}

/// GET /verify - Echo the identity carried by a valid token
pub async fn verify_get(Extension(auth_user): Extension<AuthUser>) -> ApiResult<AuthUser> {
    Ok(ApiResponse::success(auth_user).with_message("Token is valid"))
}
