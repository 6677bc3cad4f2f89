//! Stress detection through an external model script.
//!
//! An uploaded image is staged on disk, handed to the configured
//! interpreter and script, and the script's JSON verdict is returned. The
//! staged file is removed whatever the outcome.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::StressConfig;
use crate::SereneError;

/// Longest stderr excerpt kept in errors and logs.
const STDERR_EXCERPT: usize = 2000;

/// Errors from a detection run.
#[derive(Debug, Error)]
pub enum StressError {
    /// The upload could not be staged or the process could not start.
    #[error("failed to run detection: {0}")]
    Io(#[from] std::io::Error),

    /// The script did not finish in time.
    #[error("detection timed out after {0} seconds")]
    Timeout(u64),

    /// The script exited unsuccessfully.
    #[error("detection exited with code {code}: {stderr}")]
    ProcessFailed {
        /// Exit code, -1 if killed by a signal.
        code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// The script's stdout was not the expected JSON.
    #[error("invalid detection output: {0}")]
    InvalidOutput(String),
}

impl From<StressError> for SereneError {
    fn from(e: StressError) -> Self {
        SereneError::Stress(e.to_string())
    }
}

/// Verdict printed by the model script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressReport {
    /// Human-readable stress label.
    pub stress_label: String,
    /// Numeric stress score.
    pub stress_value: f64,
    /// Detected emotion.
    pub emotion: String,
}

/// Runs the configured detection script.
#[derive(Debug, Clone)]
pub struct StressDetector {
    config: StressConfig,
}

impl StressDetector {
    /// Create a detector.
    pub fn new(config: StressConfig) -> Self {
        Self { config }
    }

    /// Upload size limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.config.max_upload_bytes
    }

    /// Directory uploads are staged in.
    pub fn upload_dir(&self) -> &Path {
        Path::new(&self.config.upload_dir)
    }

    /// Stage an upload and run detection on it.
    ///
    /// `original_name` only contributes its extension to the staged name.
    pub async fn detect(
        &self,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<StressReport, StressError> {
        tokio::fs::create_dir_all(self.upload_dir()).await?;
        let path = self.upload_dir().join(staged_file_name(original_name));
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Upload staged");

        let result = self.run(&path).await;

        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove staged upload");
        }
        result
    }

    /// Run the script on an image already on disk.
    pub async fn run(&self, image: &Path) -> Result<StressReport, StressError> {
        let mut cmd = Command::new(&self.config.interpreter);
        cmd.arg(&self.config.script)
            .arg(image)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!(interpreter = %self.config.interpreter, error = %e, "Failed to start detection");
                return Err(StressError::Io(e));
            }
            Err(_) => {
                error!(timeout_secs = self.config.timeout_secs, "Detection timed out");
                return Err(StressError::Timeout(self.config.timeout_secs));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr: String = String::from_utf8_lossy(&output.stderr)
                .chars()
                .take(STDERR_EXCERPT)
                .collect();
            let code = output.status.code().unwrap_or(-1);
            error!(code, stderr = %stderr, "Detection process failed");
            return Err(StressError::ProcessFailed { code, stderr });
        }

        let report = parse_report(&stdout)?;
        info!(
            label = %report.stress_label,
            value = report.stress_value,
            emotion = %report.emotion,
            "Detection finished"
        );
        Ok(report)
    }
}

/// Parse the script's stdout.
pub fn parse_report(stdout: &str) -> Result<StressReport, StressError> {
    serde_json::from_str(stdout.trim()).map_err(|e| {
        warn!(output = %stdout, "Unparseable detection output");
        StressError::InvalidOutput(e.to_string())
    })
}

/// Unique staging name: `<millis>-<random><.ext>`.
fn staged_file_name(original_name: Option<&str>) -> String {
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    let extension = original_name
        .map(PathBuf::from)
        .and_then(|p| p.extension().map(|e| e.to_string_lossy().into_owned()))
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("{}-{}{}", Utc::now().timestamp_millis(), suffix, extension)
}
