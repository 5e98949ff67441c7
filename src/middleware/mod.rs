pub mod auth;
pub mod response;

pub use auth::{extract_token, jwt_auth_middleware, require_role, AuthUser};
pub use response::{expose_error_detail, ApiResponse, ApiResult};
