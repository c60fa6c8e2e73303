//! In-memory subscriber connections for unit tests.
//!
//! Real sockets are replaced by `futures_util::sink::unfold` sinks so the
//! registry, engine and prober can be driven without a network.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::Message;
use futures_util::sink;
use tokio::sync::mpsc;

use crate::domain::{Connection, ConnectionId};

/// Write deadline used by test connections that are expected to succeed.
pub(crate) const TEST_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Connection whose frames land in the returned receiver.
///
/// Dropping the receiver makes every later write fail.
pub(crate) fn channel_connection() -> (Connection, mpsc::UnboundedReceiver<Message>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink = sink::unfold(tx, |tx, frame: Message| async move {
        tx.send(frame)
            .map_err(|_| axum::Error::new("subscriber went away"))?;
        Ok::<_, axum::Error>(tx)
    });
    (
        Connection::new(ConnectionId::new(), sink, TEST_WRITE_TIMEOUT),
        rx,
    )
}

/// Connection whose every write fails immediately.
pub(crate) fn failing_connection() -> Connection {
    let sink = sink::unfold((), |(), _frame: Message| async move {
        Err::<(), _>(axum::Error::new("connection reset by peer"))
    });
    Connection::new(ConnectionId::new(), sink, TEST_WRITE_TIMEOUT)
}

/// Connection whose writes never complete.
pub(crate) fn stalled_connection(write_timeout: Duration) -> Connection {
    let sink = sink::unfold((), |(), _frame: Message| async move {
        std::future::pending::<()>().await;
        Ok::<_, axum::Error>(())
    });
    Connection::new(ConnectionId::new(), sink, write_timeout)
}

/// Returns the payload of a text frame.
pub(crate) fn text_of(frame: &Message) -> Option<String> {
    match frame {
        Message::Text(text) => Some(text.as_str().to_owned()),
        _ => None,
    }
}

/// Collects every text frame currently buffered in `rx`.
pub(crate) fn drain_texts(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<String> {
    let mut texts = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if let Some(text) = text_of(&frame) {
            texts.push(text);
        }
    }
    texts
}

/// In-memory log sink for asserting on emitted events.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Subscriber writing plain-text events at `WARN` and above into `self`.
    pub(crate) fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let capture = self.clone();
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || capture.clone())
            .finish()
    }

    /// Everything written so far.
    pub(crate) fn contents(&self) -> String {
        self.0
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
