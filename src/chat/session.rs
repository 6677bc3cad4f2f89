//! Per-connection chat session.
//!
//! A session drives one connection through its lifecycle:
//!
//! ```text
//! Connecting -> Idle -> InRoom -> Disconnected
//!                 \_______________/
//! ```
//!
//! Events from a single connection are handled one at a time, in arrival
//! order. Sessions share state only through the [`ChatHub`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::error::ChatError;
use super::events::{ClientEvent, MessagePayload, ServerEvent};
use super::hub::ChatHub;
use super::registry::Outbox;
use super::store::ChatMessage;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport is up, identity not yet resolved.
    Connecting,
    /// Ready for requests, not in any room yet.
    Idle,
    /// Member of at least one room.
    InRoom,
    /// Torn down; no further events are accepted.
    Disconnected,
}

/// One client connection.
pub struct ChatSession {
    hub: Arc<ChatHub>,
    connection_id: String,
    username: Option<String>,
    rooms: Vec<String>,
    state: SessionState,
}

impl ChatSession {
    /// Open a session for a freshly accepted connection.
    ///
    /// Registers the outbound queue, then tries to claim an identity. A
    /// connection that gets no identity still opens; it can join rooms and
    /// read history but its messages are rejected.
    pub async fn open(hub: Arc<ChatHub>, connection_id: impl Into<String>, outbox: Outbox) -> Self {
        let connection_id = connection_id.into();
        hub.rooms().register(&connection_id, outbox).await;

        let mut session = Self {
            hub,
            connection_id,
            username: None,
            rooms: Vec::new(),
            state: SessionState::Connecting,
        };

        if let Err(e) = session.identify().await {
            session.report(&e).await;
        }
        session.state = SessionState::Idle;
        session
    }

    async fn identify(&mut self) -> Result<(), ChatError> {
        let user = self
            .hub
            .directory()
            .claim_unassigned(&self.connection_id)
            .await?
            .ok_or(ChatError::NoIdentityAvailable)?;

        self.hub
            .rooms()
            .send_to(
                &self.connection_id,
                ServerEvent::AssignUsername(user.username.clone()),
            )
            .await;
        self.hub
            .presence()
            .insert(&self.connection_id, &user.username)
            .await;
        self.hub.broadcast_online_users().await;

        info!(
            connection_id = %self.connection_id,
            username = %user.username,
            "Identity assigned"
        );
        self.username = Some(user.username);
        Ok(())
    }

    /// Connection ID.
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Username claimed at connect time, if any.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Whether the session holds an identity.
    pub fn is_identified(&self) -> bool {
        self.username.is_some()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Rooms joined so far, in join order.
    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    /// Most recently joined room.
    pub fn current_room(&self) -> Option<&str> {
        self.rooms.last().map(String::as_str)
    }

    /// Parse and handle a raw text frame.
    pub async fn handle_frame(&mut self, frame: &str) -> Result<(), ChatError> {
        match ClientEvent::parse(frame) {
            Ok(event) => self.handle(event).await,
            Err(e) => {
                self.report(&e).await;
                Err(e)
            }
        }
    }

    /// Handle one client event.
    ///
    /// Failures are reported to the client (when enabled) and returned; the
    /// session itself stays usable.
    pub async fn handle(&mut self, event: ClientEvent) -> Result<(), ChatError> {
        if self.state == SessionState::Disconnected {
            return Err(ChatError::Transport("session is closed".to_string()));
        }

        let result = match event {
            ClientEvent::JoinRoom(room) => self.join_room(&room).await.map(|_| ()),
            ClientEvent::SendMessage { text, room } => {
                self.send_message(&text, &room).await.map(|_| ())
            }
        };

        if let Err(ref e) = result {
            self.report(e).await;
        }
        result
    }

    /// Join a room and receive its history privately.
    ///
    /// Returns the number of history messages delivered. Memberships
    /// accumulate; re-joining a room only re-sends its history.
    pub async fn join_room(&mut self, room: &str) -> Result<usize, ChatError> {
        let room = validate_room(room)?;

        // Hold the room's delivery lock so no message lands between the
        // snapshot and the membership becoming visible.
        let delivery = self.hub.room_delivery(room).await;
        let _delivery = delivery.lock().await;

        self.hub.rooms().join(&self.connection_id, room).await;
        if !self.rooms.iter().any(|r| r == room) {
            self.rooms.push(room.to_string());
        }
        self.state = SessionState::InRoom;

        let history: Vec<MessagePayload> = self
            .hub
            .messages()
            .history(room)
            .await?
            .iter()
            .map(MessagePayload::from)
            .collect();
        let count = history.len();

        self.hub
            .rooms()
            .send_to(
                &self.connection_id,
                ServerEvent::LoadPreviousMessages(history),
            )
            .await;

        debug!(
            connection_id = %self.connection_id,
            room,
            history = count,
            "Joined room"
        );
        Ok(count)
    }

    /// Post a message to a room.
    ///
    /// The sender is resolved from the user directory on every call, so a
    /// connection that holds no claim cannot post. The message is stored
    /// first and then delivered to every member of the room, including the
    /// sender if it joined. The sender need not be a member.
    pub async fn send_message(&mut self, text: &str, room: &str) -> Result<ChatMessage, ChatError> {
        let room = validate_room(room)?;
        self.validate_text(text)?;

        let delivery = self.hub.room_delivery(room).await;
        let _delivery = delivery.lock().await;

        let sender = self
            .hub
            .directory()
            .find_claimant_username(&self.connection_id)
            .await?
            .ok_or(ChatError::NoIdentityAvailable)?;

        let message = self.hub.messages().append(room, &sender, text).await?;
        let delivered = self
            .hub
            .rooms()
            .broadcast(room, &ServerEvent::ReceiveMessage((&message).into()))
            .await;
        let member = self.hub.rooms().is_member(&self.connection_id, room).await;

        debug!(
            connection_id = %self.connection_id,
            room,
            sender = %sender,
            delivered,
            member,
            "Message sent"
        );
        Ok(message)
    }

    /// Tear the session down.
    ///
    /// Drops room memberships, announces the departure if the session was
    /// identified and releases its claim. Calling this twice is harmless.
    pub async fn close(&mut self) {
        if self.state == SessionState::Disconnected {
            return;
        }
        self.state = SessionState::Disconnected;

        self.hub.rooms().unregister(&self.connection_id).await;

        let mut online_secs = None;
        if self.username.is_some() {
            if let Some(entry) = self.hub.presence().remove(&self.connection_id).await {
                online_secs = Some((Utc::now() - entry.since).num_seconds());
            }
            self.hub.broadcast_online_users().await;
        }

        if let Err(e) = self.hub.directory().release(&self.connection_id).await {
            warn!(
                connection_id = %self.connection_id,
                error = %e,
                "Failed to release identity"
            );
        }

        let remaining = self.hub.rooms().connection_count().await;
        info!(
            connection_id = %self.connection_id,
            username = self.username.as_deref().unwrap_or("-"),
            online_secs,
            remaining,
            "Session closed"
        );
    }

    fn validate_text(&self, text: &str) -> Result<(), ChatError> {
        let max = self.hub.config().max_message_length;
        if text.trim().is_empty() {
            return Err(ChatError::Transport("message is empty".to_string()));
        }
        if text.chars().count() > max {
            return Err(ChatError::Transport(format!(
                "message exceeds {max} characters"
            )));
        }
        Ok(())
    }

    async fn report(&self, err: &ChatError) {
        match err {
            ChatError::Storage(_) => warn!(
                connection_id = %self.connection_id,
                error = %err,
                "Chat request failed"
            ),
            _ => debug!(
                connection_id = %self.connection_id,
                error = %err,
                "Chat request rejected"
            ),
        }

        if self.hub.config().report_errors {
            self.hub
                .rooms()
                .send_to(&self.connection_id, ServerEvent::error(err))
                .await;
        }
    }
}

fn validate_room(room: &str) -> Result<&str, ChatError> {
    if room.trim().is_empty() {
        return Err(ChatError::Transport("room name is empty".to_string()));
    }
    Ok(room)
}
