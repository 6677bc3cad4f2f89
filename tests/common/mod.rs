//! Test helpers for chat integration tests.
//!
//! Provides an in-memory chat hub and a TestClient that pairs a
//! ChatSession with the receiving end of its outbound queue.

#![allow(dead_code)]

use std::sync::Arc;

use serene::chat::{outbox, ChatHub, ChatSession, Inbox, MessagePayload, ServerEvent};
use serene::config::ChatConfig;
use serene::Database;
use tempfile::TempDir;

/// Create a hub over an in-memory database seeded with `users`.
pub async fn create_test_hub(users: &[&str]) -> (Database, Arc<ChatHub>) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let hub = hub_for(&db, users).await;
    (db, hub)
}

/// Create a hub over an on-disk database in `dir` seeded with `users`.
///
/// Unlike the in-memory database this one has a multi-connection pool, so
/// concurrent sessions really interleave at the database.
pub async fn create_file_hub(dir: &TempDir, users: &[&str]) -> (Database, Arc<ChatHub>) {
    let db = Database::open(dir.path().join("serene.db"))
        .await
        .expect("Failed to open test database");
    let hub = hub_for(&db, users).await;
    (db, hub)
}

/// Create a hub over an existing database seeded with `users`.
pub async fn hub_for(db: &Database, users: &[&str]) -> Arc<ChatHub> {
    let hub = Arc::new(ChatHub::with_config(
        db.pool().clone(),
        ChatConfig::default(),
    ));
    let names: Vec<String> = users.iter().map(|s| s.to_string()).collect();
    hub.seed_users(&names).await.expect("Failed to seed users");
    hub
}

/// A connected chat client.
pub struct TestClient {
    pub session: ChatSession,
    inbox: Inbox,
}

impl TestClient {
    /// Open a session on the hub.
    pub async fn connect(hub: &Arc<ChatHub>, connection_id: &str) -> Self {
        let (tx, inbox) = outbox();
        let session = ChatSession::open(Arc::clone(hub), connection_id, tx).await;
        Self { session, inbox }
    }

    /// Username assigned at connect time.
    pub fn username(&self) -> Option<String> {
        self.session.username().map(str::to_string)
    }

    /// Send a raw frame as a client would.
    pub async fn send_frame(&mut self, frame: &str) {
        let _ = self.session.handle_frame(frame).await;
    }

    /// Send a `joinRoom` event.
    pub async fn join(&mut self, room: &str) {
        let frame = serde_json::json!({"event": "joinRoom", "data": room}).to_string();
        self.send_frame(&frame).await;
    }

    /// Send a `sendMessage` event.
    pub async fn say(&mut self, room: &str, text: &str) {
        let frame = serde_json::json!({
            "event": "sendMessage",
            "data": {"text": text, "room": room}
        })
        .to_string();
        self.send_frame(&frame).await;
    }

    /// Take every event queued so far.
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.inbox.try_recv() {
            events.push(event);
        }
        events
    }

    /// Take queued events and keep only received messages.
    pub fn received(&mut self) -> Vec<MessagePayload> {
        self.drain()
            .into_iter()
            .filter_map(|e| match e {
                ServerEvent::ReceiveMessage(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    /// Disconnect.
    pub async fn disconnect(mut self) {
        self.session.close().await;
    }
}

/// Latest online-user list among the events, if any.
pub fn last_online_users(events: &[ServerEvent]) -> Option<Vec<String>> {
    events.iter().rev().find_map(|e| match e {
        ServerEvent::UpdateOnlineUsers(users) => Some(users.clone()),
        _ => None,
    })
}

/// History delivered among the events, if any.
pub fn loaded_history(events: &[ServerEvent]) -> Option<Vec<MessagePayload>> {
    events.iter().find_map(|e| match e {
        ServerEvent::LoadPreviousMessages(history) => Some(history.clone()),
        _ => None,
    })
}
