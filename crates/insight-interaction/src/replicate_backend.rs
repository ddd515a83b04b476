//! ReplicateBackend - REST implementation of the prediction service.
//!
//! Predictions are created against a model (`owner/name`) or a pinned model
//! version (`owner/name:version`) and then fetched by id until they finish.
//! Configuration priority: session token > secret.json > environment variables

use async_trait::async_trait;
use insight_core::config::{AppConfig, DEFAULT_BASE_URL};
use insight_core::error::{InsightError, Result};
use insight_core::prediction::{
    PredictionBackend, PredictionHandle, PredictionRequest, PredictionSnapshot, PredictionStatus,
};
use insight_core::secret::Credential;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Backend implementation that talks to the Replicate HTTP API.
#[derive(Clone)]
pub struct ReplicateBackend {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl ReplicateBackend {
    /// Creates a backend for the public API. A `None` token yields a backend
    /// whose every call fails with a credential error.
    pub fn new(api_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token,
        }
    }

    /// Builds a backend from application settings and a resolved credential.
    pub fn from_config(config: &AppConfig, credential: &Credential) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| InsightError::config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_token: credential.token().map(str::to_string),
        })
    }

    /// Overrides the API root (useful for proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| InsightError::config(format!("Failed to build HTTP client: {err}")))?;
        Ok(self)
    }

    pub fn has_token(&self) -> bool {
        self.api_token.is_some()
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.api_token.as_deref().ok_or_else(|| {
            InsightError::credential("API token could not be loaded")
        })?;
        Ok(builder
            .bearer_auth(token)
            .header("content-type", "application/json"))
    }

    fn root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    async fn send(&self, builder: RequestBuilder) -> Result<PredictionSnapshot> {
        let response = self
            .authorized(builder)?
            .send()
            .await
            .map_err(|err| InsightError::transport(format!("Replicate request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Replicate error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: PredictionResponse = response.json().await.map_err(|err| {
            InsightError::serialization("JSON", format!("Failed to parse Replicate response: {err}"))
        })?;

        Ok(parsed.into_snapshot())
    }
}

#[async_trait]
impl PredictionBackend for ReplicateBackend {
    async fn create_prediction(
        &self,
        model_id: &str,
        request: &PredictionRequest,
    ) -> Result<PredictionSnapshot> {
        let (url, body) = match ModelRef::parse(model_id)? {
            ModelRef::Latest { owner, name } => (
                format!("{}/models/{owner}/{name}/predictions", self.root()),
                CreatePredictionRequest {
                    version: None,
                    input: request,
                },
            ),
            ModelRef::Version { version } => (
                format!("{}/predictions", self.root()),
                CreatePredictionRequest {
                    version: Some(version),
                    input: request,
                },
            ),
        };

        self.send(self.client.post(url).json(&body)).await
    }

    async fn reload(&self, handle: &PredictionHandle) -> Result<PredictionSnapshot> {
        let url = format!("{}/predictions/{}", self.root(), handle.id);
        self.send(self.client.get(url)).await
    }

    async fn cancel(&self, handle: &PredictionHandle) -> Result<()> {
        let url = format!("{}/predictions/{}/cancel", self.root(), handle.id);
        self.send(self.client.post(url)).await.map(|_| ())
    }
}

/// Where a prediction is created.
#[derive(Debug, PartialEq, Eq)]
enum ModelRef<'a> {
    Latest { owner: &'a str, name: &'a str },
    Version { version: &'a str },
}

impl<'a> ModelRef<'a> {
    fn parse(model_id: &'a str) -> Result<Self> {
        if let Some((_, version)) = model_id.split_once(':') {
            if version.is_empty() {
                return Err(InsightError::config(format!("Invalid model id '{model_id}'")));
            }
            return Ok(Self::Version { version });
        }
        match model_id.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self::Latest { owner, name })
            }
            _ => Err(InsightError::config(format!(
                "Invalid model id '{model_id}', expected 'owner/name'"
            ))),
        }
    }
}

#[derive(Serialize)]
struct CreatePredictionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    input: &'a PredictionRequest,
}

#[derive(Deserialize)]
struct PredictionResponse {
    id: String,
    status: PredictionStatus,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl PredictionResponse {
    fn into_snapshot(self) -> PredictionSnapshot {
        PredictionSnapshot {
            handle: PredictionHandle { id: self.id },
            status: self.status,
            output: self.output.and_then(output_fragments),
            error: self.error.and_then(|value| match value {
                Value::Null => None,
                Value::String(message) => Some(message),
                other => Some(other.to_string()),
            }),
        }
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    detail: String,
}

/// Language models stream text as an array of string fragments. A bare string
/// is accepted as a single fragment; any other shape is treated as no output.
fn output_fragments(value: Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect(),
        Value::String(text) => Some(vec![text]),
        _ => None,
    }
}

fn map_http_error(status: StatusCode, body: String) -> InsightError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.detail)
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => InsightError::credential(message),
        _ => InsightError::remote(Some(status.as_u16()), message),
    }
}
