//! Conversational assistant.
//!
//! Prompts are forwarded to a [`TextGenerator`] and the reply is cleaned of
//! markdown emphasis and cut down to its first few sentences.

mod gemini;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::Result;

pub use gemini::GeminiClient;

/// Number of sentences kept in a reply.
pub const MAX_SENTENCES: usize = 3;

/// A text generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Generate a completion for a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Assistant front end over a generator.
#[derive(Clone)]
pub struct Assistant {
    generator: Arc<dyn TextGenerator>,
}

impl Assistant {
    /// Wrap a generator.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Produce a short, plain-text reply to `message`.
    pub async fn reply(&self, message: &str) -> Result<String> {
        let raw = self.generator.generate(message).await?;
        let reply = summarize(&clean_markdown(&raw));
        debug!(
            backend = self.generator.name(),
            raw_len = raw.len(),
            reply_len = reply.len(),
            "Assistant replied"
        );
        Ok(reply)
    }
}

/// Strip every `*` from the text.
pub fn clean_markdown(text: &str) -> String {
    text.replace('*', "")
}

/// Keep the first sentences of a reply.
///
/// Sentences are delimited by `". "`. A trailing period is added whenever
/// more than one piece was kept.
pub fn summarize(text: &str) -> String {
    let pieces: Vec<&str> = text.split(". ").take(MAX_SENTENCES).collect();
    let mut summary = pieces.join(". ");
    if pieces.len() > 1 {
        summary.push('.');
    }
    summary
}
