//! Shared domain types for Parley.
//!
//! This crate contains the conversation data model, push-event types,
//! error taxonomies, and service configuration shared across the Parley
//! workspace.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod event;
