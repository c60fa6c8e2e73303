//! WebSocket layer: subscription upgrade and per-subscriber sessions.
//!
//! The endpoint at `/ws` turns each accepted upgrade into a registered
//! subscriber that receives every broadcast message as a text frame.

pub mod connection;
pub mod handler;
