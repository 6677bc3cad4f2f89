//! Serene - wellness community backend
//!
//! Real-time room chat with identities drawn from a pre-provisioned user
//! pool, a stress detection endpoint backed by an external model script,
//! and an assistant endpoint backed by a generative language API.

pub mod assistant;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod stress;
pub mod web;

pub use chat::{ChatHub, ChatSession, StartupReport};
pub use config::Config;
pub use db::{Database, User, UserDirectory};
pub use error::{Result, SereneError};
