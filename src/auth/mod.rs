pub mod password;
pub mod role;
pub mod token;

pub use password::{PasswordError, PasswordService, StoredHash};
pub use role::{Role, RoleSet};
pub use token::{Claims, TokenError, TokenIdentity, TokenService};
