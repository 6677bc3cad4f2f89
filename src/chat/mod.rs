//! Chat module for Serene.
//!
//! This module provides the real-time chat core:
//! - Identity assignment from a pool of pre-provisioned users
//! - Presence tracking and online-user broadcasts
//! - Rooms with persisted, ordered history
//! - The per-connection session state machine

mod error;
mod events;
mod hub;
mod presence;
mod registry;
mod session;
mod store;

pub use error::ChatError;
pub use events::{ClientEvent, MessagePayload, ServerEvent};
pub use hub::{ChatHub, StartupReport};
pub use presence::{PresenceEntry, PresenceTracker};
pub use registry::{outbox, Inbox, Outbox, RoomRegistry};
pub use session::{ChatSession, SessionState};
pub use store::{ChatMessage, MessageStore};
