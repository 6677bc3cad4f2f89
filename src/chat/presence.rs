//! Presence tracking for chat connections.
//!
//! Maps connection IDs to the username they claimed. This is a cache used to
//! build the online-users broadcast; the user directory remains the source
//! of truth for who holds which identity.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// One online connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEntry {
    /// Connection ID.
    pub connection_id: String,
    /// Claimed username.
    pub username: String,
    /// When the identity was claimed.
    pub since: DateTime<Utc>,
}

/// In-memory map from connection ID to username.
///
/// Entries are kept in arrival order so the online list is stable.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    entries: RwLock<Vec<PresenceEntry>>,
}

impl PresenceTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `connection_id` is online as `username`.
    ///
    /// Replaces any existing entry for the same connection.
    pub async fn insert(&self, connection_id: impl Into<String>, username: impl Into<String>) {
        let entry = PresenceEntry {
            connection_id: connection_id.into(),
            username: username.into(),
            since: Utc::now(),
        };

        let mut entries = self.entries.write().await;
        if let Some(existing) = entries
            .iter_mut()
            .find(|e| e.connection_id == entry.connection_id)
        {
            *existing = entry;
        } else {
            entries.push(entry);
        }
    }

    /// Remove a connection. Returns its entry, if it was online.
    pub async fn remove(&self, connection_id: &str) -> Option<PresenceEntry> {
        let mut entries = self.entries.write().await;
        let index = entries
            .iter()
            .position(|e| e.connection_id == connection_id)?;
        Some(entries.remove(index))
    }

    /// Username for a connection.
    pub async fn username(&self, connection_id: &str) -> Option<String> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.connection_id == connection_id)
            .map(|e| e.username.clone())
    }

    /// Usernames of all online connections in arrival order.
    pub async fn online_usernames(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|e| e.username.clone())
            .collect()
    }

    /// Snapshot of all entries.
    pub async fn entries(&self) -> Vec<PresenceEntry> {
        self.entries.read().await.clone()
    }

    /// Number of online connections.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nobody is online.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let presence = PresenceTracker::new();
        presence.insert("c1", "alice").await;

        assert_eq!(presence.username("c1").await, Some("alice".to_string()));
        assert_eq!(presence.username("c2").await, None);
        assert_eq!(presence.len().await, 1);
    }

    #[tokio::test]
    async fn test_online_usernames_keep_arrival_order() {
        let presence = PresenceTracker::new();
        presence.insert("c2", "bob").await;
        presence.insert("c1", "alice").await;
        presence.insert("c3", "carol").await;

        assert_eq!(
            presence.online_usernames().await,
            vec!["bob", "alice", "carol"]
        );
    }

    #[tokio::test]
    async fn test_insert_replaces_same_connection() {
        let presence = PresenceTracker::new();
        presence.insert("c1", "alice").await;
        presence.insert("c1", "alice2").await;

        assert_eq!(presence.online_usernames().await, vec!["alice2"]);
    }

    #[tokio::test]
    async fn test_remove() {
        let presence = PresenceTracker::new();
        presence.insert("c1", "alice").await;
        presence.insert("c2", "bob").await;

        let removed = presence.remove("c1").await.unwrap();
        assert_eq!(removed.username, "alice");
        assert!(removed.since <= Utc::now());
        assert_eq!(presence.remove("c1").await, None);
        assert_eq!(presence.online_usernames().await, vec!["bob"]);
    }

    #[tokio::test]
    async fn test_is_empty() {
        let presence = PresenceTracker::new();
        assert!(presence.is_empty().await);
        presence.insert("c1", "alice").await;
        assert!(!presence.is_empty().await);
        assert_eq!(presence.entries().await[0].connection_id, "c1");
    }

    #[tokio::test]
    async fn test_concurrent_inserts() {
        let presence = Arc::new(PresenceTracker::new());
        let mut handles = Vec::new();
        for i in 0..10 {
            let presence = Arc::clone(&presence);
            handles.push(tokio::spawn(async move {
                presence.insert(format!("c{i}"), format!("user{i}")).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(presence.len().await, 10);
    }
}
