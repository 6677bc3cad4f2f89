//! API handlers.

pub mod assistant;
pub mod stress;
pub mod wellness;

pub use assistant::*;
pub use stress::*;
pub use wellness::*;

use std::sync::Arc;

use crate::assistant::Assistant;
use crate::chat::ChatHub;
use crate::stress::StressDetector;

/// Shared state for all handlers.
pub struct AppState {
    /// Chat core shared by every WebSocket session.
    pub hub: Arc<ChatHub>,
    /// Stress detection runner.
    pub stress: StressDetector,
    /// Assistant front end.
    pub assistant: Assistant,
}

impl AppState {
    /// Create a new application state.
    pub fn new(hub: Arc<ChatHub>, stress: StressDetector, assistant: Assistant) -> Self {
        Self {
            hub,
            stress,
            assistant,
        }
    }
}
