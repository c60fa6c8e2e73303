//! One live subscriber channel.
//!
//! A [`Connection`] owns the write half of a subscriber's WebSocket. Every
//! write (broadcast frame, liveness ping, close frame) goes through the same
//! per-connection lock and is bounded by the write deadline, so a stalled
//! peer can only ever cost one deadline per attempt.
//!
//! Closing is gated by a `watch` flag: the first caller of
//! [`Connection::close`] or [`Connection::abort`] flips it and tears down the
//! sink, every later caller is a no-op. Tasks tied to the connection (read loop, prober) await
//! [`Connection::closed`] to stop promptly.

use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt};
use tokio::sync::{Mutex, watch};

use super::ConnectionId;
use crate::error::RelayError;

/// Type-erased write half of a subscriber socket.
pub type BoxedSink = Pin<Box<dyn Sink<Message, Error = axum::Error> + Send>>;

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Writes are accepted.
    Open,
    /// The connection has been closed; every write fails.
    Closed,
}

/// A subscriber connection: identity, bounded writer, close-once gate.
pub struct Connection {
    id: ConnectionId,
    sink: Mutex<Option<BoxedSink>>,
    write_timeout: Duration,
    closed: watch::Sender<bool>,
}

impl Connection {
    /// Wraps the write half of a subscriber socket.
    ///
    /// `write_timeout` bounds every individual write and the final close
    /// handshake.
    pub fn new<S>(id: ConnectionId, sink: S, write_timeout: Duration) -> Self
    where
        S: Sink<Message, Error = axum::Error> + Send + 'static,
    {
        let (closed, _) = watch::channel(false);
        Self {
            id,
            sink: Mutex::new(Some(Box::pin(sink))),
            write_timeout,
            closed,
        }
    }

    /// Returns the connection identity.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    pub(crate) const fn id_ref(&self) -> &ConnectionId {
        &self.id
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        if *self.closed.borrow() {
            ConnectionState::Closed
        } else {
            ConnectionState::Open
        }
    }

    /// Returns `true` while the connection has not been closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Sends a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ConnectionClosed`] if the connection is closed,
    /// [`RelayError::WriteTimeout`] if the write exceeds the deadline, or
    /// [`RelayError::Transport`] if the socket rejects the frame.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), RelayError> {
        self.send(Message::text(text.into())).await
    }

    /// Sends an empty liveness ping.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::send_text`].
    pub async fn ping(&self) -> Result<(), RelayError> {
        self.send(Message::Ping(Bytes::new())).await
    }

    /// Sends one frame, bounded by the write deadline.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::send_text`].
    pub async fn send(&self, message: Message) -> Result<(), RelayError> {
        let mut guard = self.sink.lock().await;
        if !self.is_open() {
            return Err(RelayError::ConnectionClosed(self.id));
        }
        let Some(sink) = guard.as_mut() else {
            return Err(RelayError::ConnectionClosed(self.id));
        };
        match tokio::time::timeout(self.write_timeout, sink.send(message)).await {
            Ok(result) => result.map_err(RelayError::from),
            Err(_) => Err(RelayError::WriteTimeout(self.write_timeout)),
        }
    }

    /// Closes the connection.
    ///
    /// Only the first call has any effect; it returns `true`. Later calls
    /// return `false` without touching the socket.
    pub async fn close(&self) -> bool {
        if self.closed.send_replace(true) {
            return false;
        }
        let sink = self.sink.lock().await.take();
        if let Some(mut sink) = sink {
            match tokio::time::timeout(self.write_timeout, sink.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::debug!(conn_id = %self.id, error = %e, "close handshake failed"),
                Err(_) => tracing::debug!(conn_id = %self.id, "close handshake timed out"),
            }
        }
        tracing::debug!(conn_id = %self.id, "connection closed");
        true
    }

    /// Closes the connection without a close handshake.
    ///
    /// For peers that already failed a write: the sink is dropped instead of
    /// flushed, so this never waits on the peer. If a write is in flight the
    /// sink is left to that writer, which sees the closed flag afterwards.
    /// Returns `true` for the call that closed the connection.
    pub fn abort(&self) -> bool {
        if self.closed.send_replace(true) {
            return false;
        }
        if let Ok(mut sink) = self.sink.try_lock() {
            *sink = None;
        }
        tracing::debug!(conn_id = %self.id, "connection aborted");
        true
    }

    /// Resolves once the connection has been closed by any path.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives in `self`, so `wait_for` can only return `Ok`.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("write_timeout", &self.write_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{
        channel_connection, failing_connection, stalled_connection, text_of,
    };

    #[tokio::test]
    async fn send_text_reaches_sink() {
        let (conn, mut rx) = channel_connection();
        assert!(conn.send_text("hello").await.is_ok());
        let Some(frame) = rx.recv().await else {
            panic!("expected a frame");
        };
        assert_eq!(text_of(&frame).as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn ping_sends_empty_ping_frame() {
        let (conn, mut rx) = channel_connection();
        assert!(conn.ping().await.is_ok());
        let Some(Message::Ping(payload)) = rx.recv().await else {
            panic!("expected a ping frame");
        };
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn failing_sink_reports_transport_error() {
        let conn = failing_connection();
        let result = conn.send_text("x").await;
        assert!(matches!(result, Err(RelayError::Transport(_))));
    }

    #[tokio::test]
    async fn stalled_sink_hits_write_deadline() {
        let conn = stalled_connection(Duration::from_millis(20));
        let result = conn.send_text("x").await;
        assert!(matches!(result, Err(RelayError::WriteTimeout(_))));
    }

    #[tokio::test]
    async fn close_happens_exactly_once() {
        let (conn, _rx) = channel_connection();
        assert!(conn.is_open());
        assert!(conn.close().await);
        assert!(!conn.close().await);
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn send_after_close_fails() {
        let (conn, _rx) = channel_connection();
        conn.close().await;
        let result = conn.send_text("late").await;
        assert!(matches!(result, Err(RelayError::ConnectionClosed(id)) if id == conn.id()));
    }

    #[tokio::test]
    async fn abort_skips_close_handshake_on_stalled_peer() {
        let conn = stalled_connection(Duration::from_millis(100));
        assert!(matches!(
            conn.send_text("x").await,
            Err(RelayError::WriteTimeout(_))
        ));

        let started = std::time::Instant::now();
        assert!(conn.abort());
        assert!(started.elapsed() < Duration::from_millis(50));
        assert!(!conn.abort());
        assert!(!conn.close().await);
        assert!(matches!(
            conn.send_text("late").await,
            Err(RelayError::ConnectionClosed(_))
        ));
    }

    #[tokio::test]
    async fn closed_resolves_after_close() {
        let (conn, _rx) = channel_connection();
        let conn = Arc::new(conn);
        let waiter = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.closed().await })
        };
        conn.close().await;
        let joined = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn concurrent_close_only_one_wins() {
        let (conn, _rx) = channel_connection();
        let conn = Arc::new(conn);
        let a = tokio::spawn({
            let conn = Arc::clone(&conn);
            async move { conn.close().await }
        });
        let b = tokio::spawn({
            let conn = Arc::clone(&conn);
            async move { conn.close().await }
        });
        let (Ok(a), Ok(b)) = (a.await, b.await) else {
            panic!("close task panicked");
        };
        assert!(a ^ b);
    }
}
