//! Concurrency-safe set of live subscriber connections.
//!
//! [`Registry`] is the only state shared by the upgrade handler, the
//! liveness probers and the broadcast engine. Every insert, delete and
//! fan-out iteration happens under one [`tokio::sync::Mutex`]; the engine
//! holds it for the whole iterate-and-evict window of a message through a
//! [`RegistryGuard`].
//!
//! Removal closes the connection as a side effect. Because
//! [`Connection::close`] is gated, two removal paths racing for the same
//! connection (a failed probe and a failed read, say) close it once.
//! Eviction under the guard aborts instead of closing, so a peer that just
//! failed a write is never waited on again while the lock is held.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use super::{Connection, ConnectionId};

/// Set element: a connection hashed and compared by identity only.
#[derive(Debug, Clone)]
struct Member(Arc<Connection>);

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.0.id() == other.0.id()
    }
}

impl Eq for Member {}

impl Hash for Member {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id().hash(state);
    }
}

impl Borrow<ConnectionId> for Member {
    fn borrow(&self) -> &ConnectionId {
        self.0.id_ref()
    }
}

/// Authoritative set of connections currently believed live.
#[derive(Debug, Default)]
pub struct Registry {
    members: Mutex<HashSet<Member>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a connection. Returns `false` if it was already registered.
    pub async fn add(&self, conn: Arc<Connection>) -> bool {
        let id = conn.id();
        let inserted = self.members.lock().await.insert(Member(conn));
        if inserted {
            tracing::debug!(conn_id = %id, "connection registered");
        }
        inserted
    }

    /// Removes a connection and closes it.
    ///
    /// Returns `true` if the connection was registered. Removing an absent
    /// connection is a no-op.
    pub async fn remove(&self, id: ConnectionId) -> bool {
        let removed = self.members.lock().await.take(&id);
        match removed {
            Some(Member(conn)) => {
                conn.close().await;
                tracing::debug!(conn_id = %id, "connection unregistered");
                true
            }
            None => false,
        }
    }

    /// Locks the registry for an iterate-and-evict pass.
    ///
    /// Concurrent [`Registry::add`] and [`Registry::remove`] calls wait
    /// until the guard is dropped.
    pub async fn lock(&self) -> RegistryGuard<'_> {
        RegistryGuard {
            members: self.members.lock().await,
        }
    }

    /// Returns `true` if the connection is registered.
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.members.lock().await.contains(&id)
    }

    /// Returns the identities of all registered connections.
    pub async fn ids(&self) -> Vec<ConnectionId> {
        self.members
            .lock()
            .await
            .iter()
            .map(|member| member.0.id())
            .collect()
    }

    /// Returns the number of registered connections.
    pub async fn len(&self) -> usize {
        self.members.lock().await.len()
    }

    /// Returns `true` if no connection is registered.
    pub async fn is_empty(&self) -> bool {
        self.members.lock().await.is_empty()
    }

    /// Unregisters and closes every connection. Returns how many were closed.
    pub async fn close_all(&self) -> usize {
        let mut guard = self.lock().await;
        let drained: Vec<Member> = guard.members.drain().collect();
        for Member(conn) in &drained {
            conn.close().await;
        }
        drained.len()
    }
}

/// Exclusive view of the registry held for one fan-out pass.
#[derive(Debug)]
pub struct RegistryGuard<'a> {
    members: MutexGuard<'a, HashSet<Member>>,
}

impl RegistryGuard<'_> {
    /// Returns the connections registered at this instant.
    #[must_use]
    pub fn connections(&self) -> Vec<Arc<Connection>> {
        self.members
            .iter()
            .map(|member| Arc::clone(&member.0))
            .collect()
    }

    /// Removes a connection and aborts it while the lock is held.
    ///
    /// Returns `true` if the connection was registered.
    pub fn evict(&mut self, id: ConnectionId) -> bool {
        match self.members.take(&id) {
            Some(Member(conn)) => {
                conn.abort();
                true
            }
            None => false,
        }
    }

    /// Returns the number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no connection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
