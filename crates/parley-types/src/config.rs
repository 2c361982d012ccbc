//! Service configuration for Parley.
//!
//! Loaded from `{data_dir}/config.toml` by parley-infra; every field has a
//! default so a missing or partial file still yields a working config.

use serde::{Deserialize, Serialize};

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default interval between push-connection keep-alive frames, in seconds.
pub const DEFAULT_HEARTBEAT_SECONDS: u64 = 30;

/// Global service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Seconds between keep-alive frames on push connections.
    pub heartbeat_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            heartbeat_seconds: DEFAULT_HEARTBEAT_SECONDS,
        }
    }
}
