//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::config::RelayConfig;
use crate::domain::Registry;
use crate::service::Broadcaster;

/// Per-connection timing settings handed to every subscriber.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    /// Interval between liveness pings.
    pub ping_interval: Duration,
    /// Deadline for any single write to the subscriber.
    pub write_timeout: Duration,
}

impl From<&RelayConfig> for ConnectionSettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            ping_interval: config.ping_interval,
            write_timeout: config.write_timeout,
        }
    }
}

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Set of live subscriber connections.
    pub registry: Arc<Registry>,
    /// Producer handle for the broadcast queue.
    pub broadcaster: Broadcaster,
    /// Timing settings for new subscriber connections.
    pub connection: ConnectionSettings,
}
