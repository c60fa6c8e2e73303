//! Subscriber connection identity.

use std::fmt;

/// Random identity assigned to a subscriber when its upgrade is accepted.
///
/// Keys the [`super::Registry`] and tags every log line as `conn_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Generates a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn fresh_ids_never_collide() {
        let ids: HashSet<ConnectionId> = (0..64).map(|_| ConnectionId::new()).collect();
        assert_eq!(ids.len(), 64);
    }

    #[test]
    fn displays_as_hyphenated_uuid() {
        let text = ConnectionId::new().to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(text.matches('-').count(), 4);
    }
}
