// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT auth, optional role set per route)

pub mod extract;
pub mod protected;
pub mod public;
