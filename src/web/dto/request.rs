//! Request DTOs for the HTTP API.

use serde::Deserialize;
use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed};

/// Maximum assistant prompt length in characters.
pub const MAX_PROMPT_LENGTH: usize = 4000;

/// Assistant chat request.
#[derive(Debug, Deserialize, Validate)]
pub struct AssistantRequest {
    /// User prompt.
    #[validate(
        length(max = 4000, message = "Message must be at most 4000 characters"),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub message: String,
}
