//! Service layer: the broadcast engine and the liveness prober.
//!
//! Both operate on the shared [`crate::domain::Registry`] and are the only
//! code paths besides the WebSocket read loop that remove subscribers.

pub mod broadcast;
pub mod liveness;

pub use broadcast::{BroadcastEngine, Broadcaster, FanOutReport};
pub use liveness::ProbeExit;
