//! Prediction domain model.
//!
//! A prediction is one request/response cycle against a hosted LLM. The
//! remote service runs predictions asynchronously: a request is submitted,
//! a handle comes back, and the handle is reloaded until it reaches a
//! terminal status.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Input sent to the model. Absent sampling parameters are not serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub prompt: String,
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_new_tokens: Option<u32>,
}

impl PredictionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            top_p: None,
            max_new_tokens: None,
        }
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = Some(max_new_tokens);
        self
    }

    /// Canonical key for memoization: two requests share a key iff they are
    /// structurally equal.
    pub fn cache_key(&self) -> String {
        // Field order is fixed by the struct definition.
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

/// Lifecycle status of a remote prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    #[serde(alias = "starting", alias = "processing")]
    Pending,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    /// Whether the status can no longer change.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Outcome handed back to callers once polling stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub status: PredictionStatus,
    pub output: Option<Vec<String>>,
}

impl PredictionResult {
    pub fn new(status: PredictionStatus, output: Option<Vec<String>>) -> Self {
        Self { status, output }
    }

    pub fn succeeded(output: Vec<String>) -> Self {
        Self::new(PredictionStatus::Succeeded, Some(output))
    }

    /// `(failed, absent)`: the uniform shape of every transport problem.
    pub fn failed() -> Self {
        Self::new(PredictionStatus::Failed, None)
    }

    pub fn canceled() -> Self {
        Self::new(PredictionStatus::Canceled, None)
    }

    pub fn is_success(&self) -> bool {
        self.status == PredictionStatus::Succeeded
    }

    /// Output fragments joined in the order the service produced them.
    pub fn joined_output(&self) -> Option<String> {
        self.output.as_ref().map(|fragments| fragments.concat())
    }
}

/// Opaque reference to a prediction running on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionHandle {
    pub id: String,
}

/// State of a prediction as last observed on the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionSnapshot {
    pub handle: PredictionHandle,
    pub status: PredictionStatus,
    pub output: Option<Vec<String>>,
    pub error: Option<String>,
}

impl PredictionSnapshot {
    pub fn into_result(self) -> PredictionResult {
        PredictionResult::new(self.status, self.output)
    }
}

/// Remote inference service operations.
#[async_trait::async_trait]
pub trait PredictionBackend: Send + Sync {
    /// Submits a new prediction and returns its initial state.
    async fn create_prediction(
        &self,
        model_id: &str,
        request: &PredictionRequest,
    ) -> Result<PredictionSnapshot>;

    /// Fetches the current state of a prediction.
    async fn reload(&self, handle: &PredictionHandle) -> Result<PredictionSnapshot>;

    /// Asks the service to stop a prediction.
    async fn cancel(&self, handle: &PredictionHandle) -> Result<()>;
}

/// How long to wait for a prediction to reach a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Maximum number of status reloads.
    pub max_polls: u32,
    /// Pause between two reloads.
    pub poll_interval: Duration,
    /// Upper bound for the whole wait, including the submit call.
    pub overall_timeout: Option<Duration>,
}

impl PollPolicy {
    pub fn new(max_polls: u32, poll_interval: Duration) -> Self {
        Self {
            max_polls,
            poll_interval,
            overall_timeout: None,
        }
    }

    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = Some(timeout);
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_working_states_map_to_pending() {
        for raw in ["\"starting\"", "\"processing\"", "\"pending\""] {
            let status: PredictionStatus = serde_json::from_str(raw).unwrap();
            assert_eq!(status, PredictionStatus::Pending);
            assert!(!status.is_terminal());
        }
        let status: PredictionStatus = serde_json::from_str("\"canceled\"").unwrap();
        assert!(status.is_terminal());
    }

    #[test]
    fn request_serializes_without_absent_options() {
        let json = serde_json::to_value(PredictionRequest::new("hi", 0.2)).unwrap();
        assert_eq!(json, serde_json::json!({"prompt": "hi", "temperature": 0.2f32}));
    }

    #[test]
    fn cache_key_follows_structural_equality() {
        let a = PredictionRequest::new("explain", 0.2);
        let b = PredictionRequest::new("explain", 0.2);
        let c = PredictionRequest::new("explain", 0.4);
        let d = PredictionRequest::new("explain", 0.2).with_top_p(0.9);
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), c.cache_key());
        assert_ne!(a.cache_key(), d.cache_key());
    }

    #[test]
    fn joined_output_preserves_fragment_order() {
        let result = PredictionResult::succeeded(vec!["Hel".into(), "lo".into(), " world".into()]);
        assert_eq!(result.joined_output().as_deref(), Some("Hello world"));
        assert_eq!(PredictionResult::failed().joined_output(), None);
    }
}
