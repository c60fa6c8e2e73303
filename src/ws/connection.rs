//! Subscriber session: registration, liveness, and the read loop.
//!
//! After the upgrade the socket is split. The write half becomes a
//! [`Connection`] shared with the registry and the prober; the read half is
//! consumed here. Reading exists mainly to notice the peer going away, but
//! text frames are also decoded as chat messages and relayed to everyone.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Stream, StreamExt};

use crate::api::dto::SubmitMessageRequest;
use crate::app_state::AppState;
use crate::domain::{Connection, ConnectionId};
use crate::error::RelayError;
use crate::service::{Broadcaster, liveness};

/// Why a subscriber session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// The peer sent a close frame or the stream ended.
    PeerClosed,
    /// Reading from the socket failed.
    ReadError,
    /// The connection was closed by the server (failed write, failed
    /// probe, or shutdown).
    ClosedByServer,
}

/// Runs a subscriber session over an upgraded socket.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (ws_tx, ws_rx) = socket.split();
    let id = ConnectionId::new();
    let conn = Arc::new(Connection::new(id, ws_tx, state.connection.write_timeout));
    let reason = serve_subscriber(conn, ws_rx, state).await;
    tracing::info!(conn_id = %id, ?reason, "subscriber disconnected");
}

/// Registers `conn`, starts its prober, and reads `frames` until the
/// connection dies. The connection is unregistered and closed on return.
///
/// A connection arriving after the broadcast engine has stopped is closed
/// straight away.
pub async fn serve_subscriber<S>(conn: Arc<Connection>, mut frames: S, state: AppState) -> Disconnect
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let id = conn.id();
    state.registry.add(Arc::clone(&conn)).await;
    // The engine closes its queue before its final `close_all`, so a
    // connection registered after that sweep is caught here.
    if state.broadcaster.is_closed() {
        state.registry.remove(id).await;
        conn.close().await;
        tracing::info!(conn_id = %id, "subscriber refused: relay is shutting down");
        return Disconnect::ClosedByServer;
    }
    let subscribers = state.registry.len().await;
    tracing::info!(conn_id = %id, subscribers, "subscriber connected");

    let prober = liveness::spawn(
        Arc::clone(&state.registry),
        Arc::clone(&conn),
        state.connection.ping_interval,
    );

    let reason = loop {
        tokio::select! {
            () = conn.closed() => break Disconnect::ClosedByServer,
            frame = frames.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    relay_inbound(id, text.as_str(), &state.broadcaster).await;
                }
                Some(Ok(Message::Close(_))) | None => break Disconnect::PeerClosed,
                Some(Ok(Message::Binary(_))) => {
                    tracing::debug!(conn_id = %id, "ignoring binary frame");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(conn_id = %id, error = %e, "websocket read error");
                    break Disconnect::ReadError;
                }
            }
        }
    };

    state.registry.remove(id).await;
    // Covers connections already dropped from the registry by shutdown.
    conn.close().await;
    if let Ok(exit) = prober.await {
        tracing::trace!(conn_id = %id, ?exit, "prober finished");
    }

    reason
}

/// Decodes a subscriber's text frame and queues it for broadcast.
///
/// Bad frames are logged and dropped; they never end the session.
async fn relay_inbound(id: ConnectionId, text: &str, broadcaster: &Broadcaster) {
    let message = serde_json::from_str::<SubmitMessageRequest>(text)
        .map_err(|e| RelayError::InvalidRequest(e.to_string()))
        .and_then(SubmitMessageRequest::into_message);

    match message {
        Ok(message) => {
            if let Err(e) = broadcaster.submit(message).await {
                tracing::warn!(conn_id = %id, error = %e, "could not queue subscriber message");
            }
        }
        Err(e) => {
            tracing::warn!(conn_id = %id, error = %e, "ignoring malformed subscriber frame");
        }
    }
}
