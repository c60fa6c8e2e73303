//! # ws-relay
//!
//! Real-time message relay. Producers submit text messages over HTTP and
//! every live WebSocket subscriber receives each one as a JSON text frame
//! `{"content": "...", "type": "..."}`.
//!
//! ## Architecture
//!
//! ```text
//! Producers (POST /api/v1/messages, POST /post)      Subscribers (GET /ws)
//!     │                                                   │
//!     ├── REST Handlers (api/)                            ├── WS session (ws/)
//!     │                                                   │     ├── read loop
//!     ▼                                                   │     └── liveness prober (service/)
//! Broadcaster ──▶ bounded queue ──▶ BroadcastEngine (service/)
//!                                        │
//!                                        ▼
//!                                   Registry (domain/) ◀── add / remove
//! ```
//!
//! The [`domain::Registry`] is the one piece of state shared by every task
//! family. Writes to a subscriber are bounded by a deadline; any failed read,
//! write or ping removes that subscriber and nobody else.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod service;
pub mod ws;

#[cfg(test)]
pub(crate) mod test_support;
