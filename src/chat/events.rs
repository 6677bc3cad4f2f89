//! Wire events exchanged with chat clients.
//!
//! Every frame is a JSON envelope `{"event": <name>, "data": <payload>}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ChatError;
use super::store::ChatMessage;

/// A message as delivered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Message body.
    pub text: String,
    /// Sender username.
    pub sender: String,
    /// Server-assigned timestamp (RFC 3339).
    pub timestamp: DateTime<Utc>,
}

impl From<&ChatMessage> for MessagePayload {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            text: msg.text.clone(),
            sender: msg.sender.clone(),
            timestamp: msg.timestamp,
        }
    }
}

/// Events sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Subscribe to a room and receive its history.
    JoinRoom(String),
    /// Post a message to a room.
    SendMessage {
        /// Message body.
        text: String,
        /// Target room.
        room: String,
    },
}

impl ClientEvent {
    /// Parse a text frame.
    pub fn parse(frame: &str) -> Result<Self, ChatError> {
        serde_json::from_str(frame).map_err(|e| ChatError::Transport(e.to_string()))
    }
}

/// Events sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// The username claimed for this connection.
    AssignUsername(String),
    /// Everyone currently online.
    UpdateOnlineUsers(Vec<String>),
    /// History of a room just joined, oldest first.
    LoadPreviousMessages(Vec<MessagePayload>),
    /// A new message in a joined room.
    ReceiveMessage(MessagePayload),
    /// A request from this connection was abandoned.
    Error {
        /// Machine-readable code.
        code: String,
        /// Human-readable description.
        message: String,
    },
}

impl ServerEvent {
    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::AssignUsername(_) => "assignUsername",
            ServerEvent::UpdateOnlineUsers(_) => "updateOnlineUsers",
            ServerEvent::LoadPreviousMessages(_) => "loadPreviousMessages",
            ServerEvent::ReceiveMessage(_) => "receiveMessage",
            ServerEvent::Error { .. } => "error",
        }
    }

    /// Build an error event.
    pub fn error(err: &ChatError) -> Self {
        ServerEvent::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    /// Serialize to a text frame.
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
