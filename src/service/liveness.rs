//! Per-connection liveness prober.
//!
//! Each subscriber gets one prober task that sends an empty WebSocket ping
//! every interval. The first ping goes out one full interval after the
//! connection is accepted. A failed ping is terminal: the prober removes the
//! connection through the registry and exits. It also exits as soon as the
//! connection is closed by any other path.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::domain::{Connection, Registry};

/// Shortest interval the prober accepts; smaller values are raised to it.
pub const MIN_PING_INTERVAL: Duration = Duration::from_millis(10);

/// Why a prober task stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeExit {
    /// The connection was closed elsewhere (read loop, broadcast, shutdown).
    ConnectionClosed,
    /// A ping write failed; the prober removed the connection.
    ProbeFailed,
}

/// Spawns the prober for `conn` on the current runtime.
pub fn spawn(
    registry: Arc<Registry>,
    conn: Arc<Connection>,
    interval: Duration,
) -> JoinHandle<ProbeExit> {
    tokio::spawn(run(registry, conn, interval))
}

/// Runs the probe loop until the connection dies.
pub async fn run(registry: Arc<Registry>, conn: Arc<Connection>, interval: Duration) -> ProbeExit {
    let interval = interval.max(MIN_PING_INTERVAL);
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = conn.closed() => {
                tracing::debug!(conn_id = %conn.id(), "prober stopped: connection closed");
                return ProbeExit::ConnectionClosed;
            }
            _ = ticker.tick() => {
                if let Err(e) = conn.ping().await {
                    tracing::warn!(conn_id = %conn.id(), error = %e, "ping failed; dropping subscriber");
                    registry.remove(conn.id()).await;
                    return ProbeExit::ProbeFailed;
                }
                tracing::trace!(conn_id = %conn.id(), "ping sent");
            }
        }
    }
}
