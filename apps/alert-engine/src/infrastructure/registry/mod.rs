//! Connection Registry
//!
//! Tracks live notification channels per user. A user may hold several
//! concurrent connections (multiple tabs, multiple devices); each gets its
//! own channel and each receives every notification addressed to the user.
//!
//! # Design
//!
//! Senders are copied out of the lock before any message is pushed, so
//! fan-out never holds the registry lock across channel operations. A send
//! to a closed channel marks that connection dead; dead connections are
//! pruned on the next write pass and a user's entry disappears entirely
//! when their last connection goes.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::domain::alert::UserId;
use crate::infrastructure::metrics;

// =============================================================================
// Types
// =============================================================================

/// Opaque handle for one registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Registry snapshot counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Users with at least one live connection.
    pub user_count: usize,
    /// Total live connections across all users.
    pub connection_count: usize,
}

// =============================================================================
// Connection Registry
// =============================================================================

/// Thread-safe map from user to their live notification channels.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<UserId, HashMap<ConnectionId, UnboundedSender<String>>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for a user. Returns its handle.
    pub fn register(&self, user_id: UserId, sender: UnboundedSender<String>) -> ConnectionId {
        let id = ConnectionId::new();
        let count = {
            let mut connections = self.connections.write();
            connections.entry(user_id).or_default().insert(id, sender);
            connections.values().map(HashMap::len).sum::<usize>()
        };
        metrics::set_ws_connections(count as f64);
        tracing::debug!(user_id, connection_id = %id, "Connection registered");
        id
    }

    /// Remove a connection. The user's entry is dropped with its last
    /// connection. Unknown ids are a no-op.
    pub fn unregister(&self, user_id: UserId, id: ConnectionId) {
        let count = {
            let mut connections = self.connections.write();
            if let Some(user_conns) = connections.get_mut(&user_id) {
                user_conns.remove(&id);
                if user_conns.is_empty() {
                    connections.remove(&user_id);
                }
            }
            connections.values().map(HashMap::len).sum::<usize>()
        };
        metrics::set_ws_connections(count as f64);
        tracing::debug!(user_id, connection_id = %id, "Connection unregistered");
    }

    /// Send a message to every live connection of a user.
    ///
    /// Returns the number of connections that accepted the message.
    /// Connections whose receiver is gone are pruned.
    pub fn fan_out(&self, user_id: UserId, message: &str) -> usize {
        // Copy senders out so the lock is not held across sends.
        let targets: Vec<(ConnectionId, UnboundedSender<String>)> = {
            let connections = self.connections.read();
            match connections.get(&user_id) {
                Some(user_conns) => user_conns
                    .iter()
                    .map(|(id, tx)| (*id, tx.clone()))
                    .collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, tx) in targets {
            if tx.send(message.to_string()).is_ok() {
                delivered += 1;
            } else {
                dead.push(id);
            }
        }

        for id in dead {
            self.unregister(user_id, id);
        }
        delivered
    }

    /// Current registry counts.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let connections = self.connections.read();
        RegistryStats {
            user_count: connections.len(),
            connection_count: connections.values().map(HashMap::len).sum(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
