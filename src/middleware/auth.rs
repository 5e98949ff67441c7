use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::auth::{Claims, Role, RoleSet};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
    pub username: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            role: claims.role,
            username: claims.username,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers()).ok_or_else(|| {
        tracing::debug!("Rejected {}: no access token", request.uri().path());
        ApiError::token_missing()
    })?;

    let claims = state.auth.verify_token(token).map_err(|_| {
        tracing::warn!("Rejected {}: invalid access token", request.uri().path());
        ApiError::token_invalid()
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Role gate for a single route. Runs after `jwt_auth_middleware`; the
/// accepted set is the middleware state.
pub async fn require_role(
    State(roles): State<RoleSet>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(user) = request.extensions().get::<AuthUser>() else {
        return Err(ApiError::token_missing());
    };

    if !roles.allows(user.role) {
        tracing::warn!(
            user_id = user.id,
            role = %user.role,
            "Denied {} {}: insufficient permissions",
            request.method(),
            request.uri().path()
        );
        return Err(ApiError::insufficient_permissions());
    }

    Ok(next.run(request).await)
}

/// Token from the `Authorization` header, raw or with a `Bearer` prefix
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let mut parts = headers.get(AUTHORIZATION)?.to_str().ok()?.split_whitespace();
    let first = parts.next()?;
    if first.eq_ignore_ascii_case("bearer") {
        parts.next()
    } else {
        Some(first)
    }
}
