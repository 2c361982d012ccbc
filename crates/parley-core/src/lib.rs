//! Business logic and store trait definitions for Parley.
//!
//! This crate defines the "ports" (the [`conversation::store::SessionStore`]
//! trait) that the infrastructure layer implements, plus the append engine,
//! the query service, and the broadcast hub. It depends only on
//! `parley-types` -- never on `parley-infra` or any database/IO crate.

pub mod broadcast;
pub mod conversation;
