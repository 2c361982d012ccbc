//! Request handlers.

pub mod conversation;
pub mod events;
pub mod health;
