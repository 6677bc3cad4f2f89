//! Shared chat state.
//!
//! The hub owns the presence tracker and room registry and hands out
//! repositories over the shared pool. It is created once at startup and
//! shared by every session as `Arc<ChatHub>`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::events::ServerEvent;
use super::presence::PresenceTracker;
use super::registry::RoomRegistry;
use super::store::MessageStore;
use crate::config::ChatConfig;
use crate::db::{DbPool, UserDirectory};
use crate::Result;

/// What the startup reset cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartupReport {
    /// Users whose stale connection claim was released.
    pub released_claims: u64,
    /// Messages deleted from the log.
    pub cleared_messages: u64,
}

/// Process-wide chat state.
pub struct ChatHub {
    pool: DbPool,
    config: ChatConfig,
    presence: PresenceTracker,
    rooms: RoomRegistry,
    /// Per-room locks serializing append+broadcast (and join+history) so
    /// that delivery order in a room always matches storage order.
    delivery: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl ChatHub {
    /// Create a hub with default chat settings.
    pub fn new(pool: DbPool) -> Self {
        Self::with_config(pool, ChatConfig::default())
    }

    /// Create a hub with explicit chat settings.
    pub fn with_config(pool: DbPool, config: ChatConfig) -> Self {
        Self {
            pool,
            config,
            presence: PresenceTracker::new(),
            rooms: RoomRegistry::new(),
            delivery: RwLock::new(HashMap::new()),
        }
    }

    /// Chat settings.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// The shared connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// User directory over the shared pool.
    pub fn directory(&self) -> UserDirectory<'_> {
        UserDirectory::new(&self.pool)
    }

    /// Message store over the shared pool.
    pub fn messages(&self) -> MessageStore<'_> {
        MessageStore::new(&self.pool)
    }

    /// Online connections.
    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Connections and room memberships.
    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// Delivery lock for one room.
    ///
    /// Rooms never contend with each other. Locks nobody holds are pruned
    /// whenever a new room's lock is created.
    pub(crate) async fn room_delivery(&self, room: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.delivery.read().await.get(room) {
            return Arc::clone(lock);
        }

        let mut locks = self.delivery.write().await;
        if let Some(lock) = locks.get(room) {
            return Arc::clone(lock);
        }
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let lock = Arc::new(Mutex::new(()));
        locks.insert(room.to_string(), Arc::clone(&lock));
        lock
    }

    /// Provision the given usernames if they do not exist yet.
    ///
    /// Returns the total number of users in the directory afterwards.
    pub async fn seed_users(&self, usernames: &[String]) -> Result<usize> {
        let directory = self.directory();
        for username in usernames {
            directory.provision(username).await?;
        }
        let total = directory.list().await?.len();
        debug!(seeded = usernames.len(), total, "User directory seeded");
        Ok(total)
    }

    /// Reset state left over from a previous run.
    ///
    /// Releases every user claim (old connection IDs are meaningless now)
    /// and truncates the message log. Safe to call more than once.
    pub async fn initialize(&self) -> Result<StartupReport> {
        let released_claims = self.directory().reset_all_claims().await?;
        let cleared_messages = self.messages().clear_all().await?;

        let report = StartupReport {
            released_claims,
            cleared_messages,
        };
        info!(
            released_claims = report.released_claims,
            cleared_messages = report.cleared_messages,
            "Chat state initialized"
        );
        Ok(report)
    }

    /// Send the current online-user list to every connection.
    pub async fn broadcast_online_users(&self) -> usize {
        let users = self.presence.online_usernames().await;
        let delivered = self
            .rooms
            .broadcast_all(&ServerEvent::UpdateOnlineUsers(users))
            .await;
        debug!(delivered, "Online users broadcast");
        delivered
    }
}
