//! HTTP and WebSocket API for Serene.
//!
//! REST endpoints for stress detection, the assistant and dashboard data,
//! plus the `/ws` chat transport.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod ws;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
