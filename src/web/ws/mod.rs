//! WebSocket transport for the chat core.

pub mod chat;

pub use chat::chat_ws_handler;
