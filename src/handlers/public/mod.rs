// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, registration, health and the route index. Nothing in
// this tier sees an AuthUser; all input is validated in the service layer.

pub mod auth;
pub mod system;

pub use auth::*;
pub use system::*;
