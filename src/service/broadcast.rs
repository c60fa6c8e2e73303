//! Broadcast queue and the single consumer that fans messages out.
//!
//! [`Broadcaster`] is the cloneable producer handle stored in the app state.
//! [`BroadcastEngine`] owns the receiving end and runs as one task for the
//! life of the server:
//!
//! ```text
//! producers ──submit──▶ mpsc (bounded) ──▶ BroadcastEngine ──▶ every Registry member
//! ```
//!
//! The queue is bounded. A producer facing a full queue waits at most the
//! configured submit timeout and then gets [`RelayError::QueueFull`]; it can
//! never block forever.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

use crate::domain::{OutboundMessage, Registry};
use crate::error::RelayError;

/// Outcome of one fan-out pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Subscribers registered when the pass started.
    pub attempted: usize,
    /// Writes that completed without error.
    pub delivered: usize,
    /// Subscribers removed because their write failed.
    pub evicted: usize,
}

/// Producer handle for the broadcast queue.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    sender: mpsc::Sender<OutboundMessage>,
    submit_timeout: Duration,
}

impl Broadcaster {
    /// Enqueues a message for delivery to every live subscriber.
    ///
    /// Success means "queued", not "delivered".
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::QueueFull`] if no slot frees up within the
    /// submit timeout, or [`RelayError::QueueClosed`] once the engine has
    /// shut down.
    pub async fn submit(&self, message: OutboundMessage) -> Result<(), RelayError> {
        self.sender
            .send_timeout(message, self.submit_timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => RelayError::QueueFull,
                SendTimeoutError::Closed(_) => RelayError::QueueClosed,
            })
    }

    /// Returns the number of messages waiting in the queue.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Returns `true` once the engine has stopped accepting messages.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Single consumer of the broadcast queue.
#[derive(Debug)]
pub struct BroadcastEngine {
    receiver: mpsc::Receiver<OutboundMessage>,
    registry: Arc<Registry>,
}

/// Creates a bounded broadcast queue delivering into `registry`.
///
/// A `capacity` of zero is raised to one.
#[must_use]
pub fn channel(
    registry: Arc<Registry>,
    capacity: usize,
    submit_timeout: Duration,
) -> (Broadcaster, BroadcastEngine) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        Broadcaster {
            sender,
            submit_timeout,
        },
        BroadcastEngine { receiver, registry },
    )
}

impl BroadcastEngine {
    /// Runs the consume loop until `shutdown` resolves or every producer
    /// handle is dropped.
    ///
    /// On exit the queue is closed, messages already admitted are still
    /// delivered, and then every registered connection is closed.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        tracing::info!("broadcast engine started");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                next = self.receiver.recv() => match next {
                    Some(message) => {
                        self.deliver(&message).await;
                    }
                    None => break,
                },
                () = &mut shutdown => {
                    tracing::info!("broadcast engine shutting down");
                    break;
                }
            }
        }

        self.receiver.close();
        let mut drained = 0usize;
        while let Some(message) = self.receiver.recv().await {
            self.deliver(&message).await;
            drained += 1;
        }

        let closed = self.registry.close_all().await;
        tracing::info!(drained, closed, "broadcast engine stopped");
    }

    /// Waits for the next queued message and delivers it.
    ///
    /// Returns `None` once the queue is closed and empty.
    pub async fn step(&mut self) -> Option<FanOutReport> {
        let message = self.receiver.recv().await?;
        Some(self.deliver(&message).await)
    }

    /// Fans one message out to every registered connection.
    ///
    /// The registry stays locked for the whole pass. A failed write evicts
    /// and aborts that connection only; the pass continues with the rest.
    pub async fn deliver(&self, message: &OutboundMessage) -> FanOutReport {
        let payload = match message.to_wire() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "dropping message that failed to encode");
                return FanOutReport::default();
            }
        };
        let frame = Message::text(payload);

        let mut members = self.registry.lock().await;
        let targets = members.connections();
        let mut report = FanOutReport {
            attempted: targets.len(),
            ..FanOutReport::default()
        };

        for conn in &targets {
            match conn.send(frame.clone()).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(conn_id = %conn.id(), error = %e, "broadcast write failed; evicting subscriber");
                    if members.evict(conn.id()) {
                        report.evicted += 1;
                    }
                }
            }
        }
        let remaining = members.len();
        drop(members);

        tracing::debug!(
            attempted = report.attempted,
            delivered = report.delivered,
            evicted = report.evicted,
            remaining,
            "broadcast pass complete"
        );
        report
    }
}
