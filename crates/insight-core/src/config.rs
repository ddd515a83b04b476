//! Configuration model.
//!
//! `AppConfig` is read from `config.toml`; secrets live in a separate
//! `secret.json` and never end up in `AppConfig`.

use crate::prediction::PollPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL_ID: &str = "snowflake/snowflake-arctic-instruct";
pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Hosted model, as `owner/name`.
    pub model_id: String,
    /// Inference API root.
    pub base_url: String,
    /// Status reloads per prediction on the analysis and code pages.
    pub max_polls: u32,
    /// Status reloads per prediction on the text-to-JSON page.
    pub extraction_max_polls: u32,
    pub poll_interval_secs: u64,
    /// HTTP timeout for a single request.
    pub request_timeout_secs: u64,
    /// Directory holding the bundled sample data files.
    pub sample_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_polls: 5,
            extraction_max_polls: 3,
            poll_interval_secs: 5,
            request_timeout_secs: 60,
            sample_dir: PathBuf::from("data"),
        }
    }
}

impl AppConfig {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(self.max_polls, Duration::from_secs(self.poll_interval_secs))
    }

    pub fn extraction_poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            self.extraction_max_polls,
            Duration::from_secs(self.poll_interval_secs),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Root structure of `secret.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicate: Option<ReplicateSecret>,
}

/// Inference service credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicateSecret {
    pub api_token: String,
}

impl std::fmt::Debug for ReplicateSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateSecret")
            .field("api_token", &"<redacted>")
            .finish()
    }
}
