// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route in this tier runs behind jwt_auth_middleware, so handlers can
// rely on an AuthUser extension. Write routes add a require_role layer.

pub mod auth;
pub mod history;
pub mod reference;
pub mod workers;

pub use auth::*;
