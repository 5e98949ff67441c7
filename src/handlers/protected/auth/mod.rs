pub mod session;

pub use session::{me_get, verify_get};
