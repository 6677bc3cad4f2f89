//! Chat message storage for Serene.
//!
//! Messages are immutable once appended. History is returned oldest first,
//! with ties on the timestamp broken by insertion order.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

use crate::db::DbPool;
use crate::Result;

/// A stored chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Row ID, increasing with insertion order.
    pub id: i64,
    /// Room the message was sent to.
    pub room: String,
    /// Username of the sender.
    pub sender: String,
    /// Message body.
    pub text: String,
    /// Server-assigned creation time.
    pub timestamp: DateTime<Utc>,
}

/// Database row type for ChatMessage.
#[derive(sqlx::FromRow)]
struct ChatMessageRow {
    id: i64,
    room: String,
    sender: String,
    text: String,
    created_at: String,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        let timestamp = match DateTime::parse_from_rfc3339(&row.created_at) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(e) => {
                warn!(
                    message_id = row.id,
                    created_at = %row.created_at,
                    error = %e,
                    "Stored message has an unreadable timestamp"
                );
                DateTime::<Utc>::default()
            }
        };

        Self {
            id: row.id,
            room: row.room,
            sender: row.sender,
            text: row.text,
            timestamp,
        }
    }
}

/// Format a timestamp so that string order matches chronological order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Repository for chat message operations.
pub struct MessageStore<'a> {
    pool: &'a DbPool,
}

impl<'a> MessageStore<'a> {
    /// Create a new MessageStore with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Append a message stamped with the current time.
    pub async fn append(&self, room: &str, sender: &str, text: &str) -> Result<ChatMessage> {
        self.append_at(room, sender, text, Utc::now()).await
    }

    /// Append a message with an explicit timestamp.
    pub async fn append_at(
        &self,
        room: &str,
        sender: &str,
        text: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<ChatMessage> {
        // Round-trip through the stored representation so the returned
        // message matches what history() will later yield.
        let created_at = format_timestamp(&timestamp);

        let row = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            INSERT INTO messages (room, sender, text, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, room, sender, text, created_at
            "#,
        )
        .bind(room)
        .bind(sender)
        .bind(text)
        .bind(&created_at)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// All messages for a room in ascending timestamp order.
    pub async fn history(&self, room: &str) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, room, sender, text, created_at
            FROM messages
            WHERE room = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(room)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }

    /// Count messages in a room.
    pub async fn count(&self, room: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE room = $1")
            .bind(room)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Delete every message. Returns the number of rows removed.
    pub async fn clear_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM messages")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
