//! Conversation persistence core: store port, append engine, query service.

pub mod append;
pub mod query;
pub mod store;
