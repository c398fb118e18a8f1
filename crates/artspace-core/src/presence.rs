//! Presence registry mapping users to their live realtime connections.
//!
//! `PresenceRegistry` is a concurrent multimap `UserId -> {ConnectionId -> sender}`
//! backed by `DashMap`. Each connection owns an unbounded `tokio::sync::mpsc`
//! channel; pushing to a user fans out to every connection registered under
//! that user's id. Pushing to a user with no live connection is a no-op.
//!
//! Shard locks are never held across an await point.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use artspace_types::chat::UserId;
use artspace_types::event::ChatEvent;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identifier of a single realtime connection (UUID v7, time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type ConnectionSender = mpsc::UnboundedSender<ChatEvent>;

/// Snapshot of a user's presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceInfo {
    pub user_id: UserId,
    pub online: bool,
    pub connections: usize,
}

/// Registry of live connections keyed by user id.
///
/// Cloning the registry shares the underlying maps.
#[derive(Clone, Default)]
pub struct PresenceRegistry {
    users: Arc<DashMap<UserId, HashMap<ConnectionId, ConnectionSender>>>,
    connections: Arc<DashMap<ConnectionId, UserId>>,
}

impl PresenceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection for `user_id`.
    ///
    /// Returns the connection id and the receiving half of its event channel.
    pub fn connect(&self, user_id: UserId) -> (ConnectionId, mpsc::UnboundedReceiver<ChatEvent>) {
        let connection_id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();

        self.users
            .entry(user_id)
            .or_default()
            .insert(connection_id, tx);
        self.connections.insert(connection_id, user_id);

        tracing::debug!(%user_id, %connection_id, "connection registered");
        (connection_id, rx)
    }

    /// Remove a connection. Users left with no connections are dropped.
    pub fn disconnect(&self, user_id: UserId, connection_id: ConnectionId) {
        if let Some(mut conns) = self.users.get_mut(&user_id) {
            conns.remove(&connection_id);
        }
        self.users.remove_if(&user_id, |_, conns| conns.is_empty());
        self.connections.remove(&connection_id);

        tracing::debug!(%user_id, %connection_id, "connection removed");
    }

    /// Push an event to every live connection of `user_id`.
    ///
    /// Returns how many connections accepted the event. Connections whose
    /// receiver has been dropped are pruned.
    pub fn send_to_user(&self, user_id: UserId, event: &ChatEvent) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        if let Some(conns) = self.users.get(&user_id) {
            for (connection_id, tx) in conns.iter() {
                if tx.send(event.clone()).is_ok() {
                    delivered += 1;
                } else {
                    closed.push(*connection_id);
                }
            }
        }

        for connection_id in closed {
            self.disconnect(user_id, connection_id);
        }

        delivered
    }

    /// Push an event to a single connection. Returns false if it is gone.
    pub fn send_to_connection(&self, connection_id: ConnectionId, event: ChatEvent) -> bool {
        let Some(user_id) = self.connections.get(&connection_id).map(|r| *r.value()) else {
            return false;
        };

        let sent = self
            .users
            .get(&user_id)
            .and_then(|conns| conns.get(&connection_id).map(|tx| tx.send(event).is_ok()))
            .unwrap_or(false);

        if !sent {
            self.disconnect(user_id, connection_id);
        }
        sent
    }

    /// Whether `user_id` has at least one live connection.
    pub fn is_online(&self, user_id: UserId) -> bool {
        self.connection_count(user_id) > 0
    }

    /// Number of live connections registered for `user_id`.
    pub fn connection_count(&self, user_id: UserId) -> usize {
        self.users.get(&user_id).map(|c| c.len()).unwrap_or(0)
    }

    /// Presence snapshot for `user_id`.
    pub fn presence(&self, user_id: UserId) -> PresenceInfo {
        let connections = self.connection_count(user_id);
        PresenceInfo {
            user_id,
            online: connections > 0,
            connections,
        }
    }

    /// All users with at least one live connection.
    pub fn online_users(&self) -> Vec<UserId> {
        self.users.iter().map(|r| *r.key()).collect()
    }

    /// Total live connections across all users.
    pub fn total_connections(&self) -> usize {
        self.connections.len()
    }
}

impl fmt::Debug for PresenceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenceRegistry")
            .field("online_users", &self.users.len())
            .field("connections", &self.connections.len())
            .finish()
    }
}
