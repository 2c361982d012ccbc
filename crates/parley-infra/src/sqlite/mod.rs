//! SQLite-backed persistence.

pub mod pool;
pub mod session;
