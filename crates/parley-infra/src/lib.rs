//! Infrastructure layer for Parley.
//!
//! Contains the SQLite implementation of the `SessionStore` trait defined
//! in `parley-core`, the split reader/writer database pool, and the TOML
//! configuration loader.

pub mod config;
pub mod sqlite;
