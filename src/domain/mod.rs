//! Domain layer: connection identity, subscriber connections, the
//! connection registry and the broadcast message type.
//!
//! Nothing in here knows about HTTP; the registry only records outcomes
//! decided by the broadcast engine, the liveness prober and the read loop.

pub mod connection;
pub mod connection_id;
pub mod outbound_message;
pub mod registry;

pub use connection::{BoxedSink, Connection, ConnectionState};
pub use connection_id::ConnectionId;
pub use outbound_message::OutboundMessage;
pub use registry::{Registry, RegistryGuard};
