//! Room membership and event delivery.
//!
//! Every live connection registers an outbound channel here. Rooms are
//! plain string keys: a room exists while at least one connection is a
//! member and vanishes with its last member.

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, RwLock};

use super::events::ServerEvent;

/// Sending half of a connection's outbound event queue.
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

/// Receiving half of a connection's outbound event queue.
pub type Inbox = mpsc::UnboundedReceiver<ServerEvent>;

/// Create an outbound queue for a new connection.
pub fn outbox() -> (Outbox, Inbox) {
    mpsc::unbounded_channel()
}

#[derive(Default)]
struct RegistryState {
    /// Outbound queue per connection.
    connections: HashMap<String, Outbox>,
    /// Member connections per room.
    rooms: HashMap<String, HashSet<String>>,
}

/// Registry of connections and their room memberships.
#[derive(Default)]
pub struct RoomRegistry {
    state: RwLock<RegistryState>,
}

impl RoomRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's outbound queue.
    pub async fn register(&self, connection_id: impl Into<String>, outbox: Outbox) {
        self.state
            .write()
            .await
            .connections
            .insert(connection_id.into(), outbox);
    }

    /// Drop a connection and every room membership it held.
    pub async fn unregister(&self, connection_id: &str) {
        let mut state = self.state.write().await;
        state.connections.remove(connection_id);
        state.rooms.retain(|_, members| {
            members.remove(connection_id);
            !members.is_empty()
        });
    }

    /// Add a connection to a room.
    ///
    /// Memberships accumulate; joining one room never leaves another.
    /// Returns true if the connection was not already a member.
    pub async fn join(&self, connection_id: &str, room: &str) -> bool {
        self.state
            .write()
            .await
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(connection_id.to_string())
    }

    /// Whether a connection is a member of a room.
    pub async fn is_member(&self, connection_id: &str, room: &str) -> bool {
        self.state
            .read()
            .await
            .rooms
            .get(room)
            .is_some_and(|members| members.contains(connection_id))
    }

    /// Number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    /// Deliver an event to one connection.
    ///
    /// Returns false if the connection is unknown or its queue is closed.
    pub async fn send_to(&self, connection_id: &str, event: ServerEvent) -> bool {
        self.state
            .read()
            .await
            .connections
            .get(connection_id)
            .is_some_and(|outbox| outbox.send(event).is_ok())
    }

    /// Deliver an event to every member of a room.
    ///
    /// Best effort: closed queues are skipped. Returns the number of
    /// connections the event was queued for.
    pub async fn broadcast(&self, room: &str, event: &ServerEvent) -> usize {
        let state = self.state.read().await;
        let Some(members) = state.rooms.get(room) else {
            return 0;
        };

        members
            .iter()
            .filter_map(|id| state.connections.get(id))
            .filter(|outbox| outbox.send(event.clone()).is_ok())
            .count()
    }

    /// Deliver an event to every registered connection.
    pub async fn broadcast_all(&self, event: &ServerEvent) -> usize {
        self.state
            .read()
            .await
            .connections
            .values()
            .filter(|outbox| outbox.send(event.clone()).is_ok())
            .count()
    }
}
