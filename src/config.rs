//! Configuration module for Serene.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, SereneError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Chat room settings.
    #[serde(default)]
    pub chat: ChatConfig,
    /// Stress detection settings.
    #[serde(default)]
    pub stress: StressConfig,
    /// Assistant (text generation) settings.
    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Directory served under `/public`. Empty disables static serving.
    #[serde(default = "default_static_path")]
    pub static_path: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_static_path() -> String {
    "public".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            static_path: default_static_path(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/serene.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/serene.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Chat room configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Usernames provisioned at startup when missing.
    #[serde(default = "default_seed_users")]
    pub seed_users: Vec<String>,
    /// Maximum length of a chat message in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    /// Send an `error` event back to the client when a request fails.
    #[serde(default = "default_report_errors")]
    pub report_errors: bool,
}

fn default_seed_users() -> Vec<String> {
    (1..=5).map(|i| format!("user{i}")).collect()
}

fn default_max_message_length() -> usize {
    2000
}

fn default_report_errors() -> bool {
    true
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            seed_users: default_seed_users(),
            max_message_length: default_max_message_length(),
            report_errors: default_report_errors(),
        }
    }
}

/// Stress detection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StressConfig {
    /// Interpreter used to run the detection script.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Path to the detection script.
    #[serde(default = "default_script")]
    pub script: String,
    /// Directory where uploads are staged.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Subprocess timeout in seconds.
    #[serde(default = "default_stress_timeout")]
    pub timeout_secs: u64,
}

fn default_interpreter() -> String {
    "python".to_string()
}

fn default_script() -> String {
    "stress_model.py".to_string()
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024 // 5MB
}

fn default_stress_timeout() -> u64 {
    60
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            script: default_script(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            timeout_secs: default_stress_timeout(),
        }
    }
}

/// Assistant (generative language API) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in a generated reply.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Stop sequences passed to the model.
    #[serde(default = "default_stop_sequences")]
    pub stop_sequences: Vec<String>,
    /// Total request timeout in seconds.
    #[serde(default = "default_assistant_timeout")]
    pub timeout_secs: u64,
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_max_output_tokens() -> u32 {
    175
}

fn default_temperature() -> f32 {
    0.8
}

fn default_stop_sequences() -> Vec<String> {
    vec!["x".to_string()]
}

fn default_assistant_timeout() -> u64 {
    30
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            stop_sequences: default_stop_sequences(),
            timeout_secs: default_assistant_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(SereneError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SereneError::Config(format!("config parse error: {e}")))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.chat.max_message_length == 0 {
            return Err(SereneError::Config(
                "chat.max_message_length must be greater than zero".to_string(),
            ));
        }
        if self.stress.max_upload_bytes == 0 {
            return Err(SereneError::Config(
                "stress.max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert!(config.server.cors_origins.is_empty());
        assert_eq!(config.server.static_path, "public");

        assert_eq!(config.database.path, "data/serene.db");

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/serene.log");

        assert_eq!(config.chat.seed_users.len(), 5);
        assert_eq!(config.chat.seed_users[0], "user1");
        assert_eq!(config.chat.max_message_length, 2000);
        assert!(config.chat.report_errors);

        assert_eq!(config.stress.interpreter, "python");
        assert_eq!(config.stress.max_upload_bytes, 5 * 1024 * 1024);

        assert_eq!(config.assistant.model, "gemini-1.5-flash");
        assert_eq!(config.assistant.max_output_tokens, 175);
        assert_eq!(config.assistant.stop_sequences, vec!["x".to_string()]);
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.chat.seed_users.len(), 5);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 8080

[chat]
seed_users = ["alice", "bob"]
report_errors = false

[stress]
interpreter = "python3"
timeout_secs = 10
"#;
        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.chat.seed_users, vec!["alice", "bob"]);
        assert!(!config.chat.report_errors);
        assert_eq!(config.chat.max_message_length, 2000);
        assert_eq!(config.stress.interpreter, "python3");
        assert_eq!(config.stress.timeout_secs, 10);
        assert_eq!(config.stress.script, "stress_model.py");
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = Config::parse("[server\nport = ");
        assert!(matches!(result, Err(SereneError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/serene/config.toml");
        assert!(matches!(result, Err(SereneError::Io(_))));
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.chat.max_message_length = 0;
        assert!(config.validate().is_err());
    }
}
