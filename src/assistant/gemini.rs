//! Google Generative Language API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use url::Url;

use super::TextGenerator;
use crate::config::AssistantConfig;
use crate::{Result, SereneError};

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// User agent string for API calls.
const USER_AGENT: &str = "Serene/0.1 (Assistant)";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    candidate_count: u32,
    stop_sequences: &'a [String],
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Client for the `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    config: AssistantConfig,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Create a client, reading the API key from the configured environment
    /// variable.
    ///
    /// A missing key is not an error here; every request fails until one
    /// is provided.
    pub fn from_env(config: AssistantConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            warn!(var = %config.api_key_env, "Assistant API key not set");
        }
        Self::new(config, api_key)
    }

    /// Create a client with an explicit API key.
    pub fn new(config: AssistantConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SereneError::Assistant(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Endpoint URL for the configured model.
    pub fn endpoint(&self) -> Result<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        Url::parse(&format!(
            "{}/models/{}:generateContent",
            base, self.config.model
        ))
        .map_err(|e| SereneError::Config(format!("invalid assistant base_url: {}", e)))
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                candidate_count: 1,
                stop_sequences: &self.config.stop_sequences,
                max_output_tokens: self.config.max_output_tokens,
                temperature: self.config.temperature,
            },
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SereneError::Assistant("API key not configured".to_string()))?;

        let response = self
            .client
            .post(self.endpoint()?)
            .header("x-goog-api-key", api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| SereneError::Assistant(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Assistant API error");
            return Err(SereneError::Assistant(format!("HTTP error: {}", status)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SereneError::Assistant(format!("invalid response: {}", e)))?;

        parsed
            .text()
            .ok_or_else(|| SereneError::Assistant("response contained no text".to_string()))
    }
}
