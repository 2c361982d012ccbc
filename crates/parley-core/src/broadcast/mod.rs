//! Live push-connection registry and event fan-out.

pub mod hub;

pub use hub::BroadcastHub;
