//! Unstructured text to JSON extraction.

use crate::orchestrator::{Orchestrator, SectionOutcome};
use crate::prompts::{EXTRACTION_EXAMPLE_TEXT, PromptLibrary};
use crate::session::AnalysisSession;
use insight_core::artifact::InputArtifact;
use insight_core::document::ExportedDocument;
use insight_core::prediction::{PollPolicy, PredictionBackend};
use insight_core::section::SectionId;
use serde_json::Value;
use std::sync::Arc;

pub const INCOMPLETE_NOTICE: &str =
    "The response is not valid JSON and may be incomplete. Showing the raw text instead.";

const DOWNLOAD_FILE_NAME: &str = "data.json";

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// Model output parsed as JSON.
    Structured { value: Value, pretty: String },
    /// Model output that is not valid JSON. No download is offered.
    Raw { text: String, notice: String },
    Failed(String),
}

impl ExtractionOutcome {
    /// Parses model output strictly; anything that is not a JSON document
    /// degrades to [`ExtractionOutcome::Raw`].
    pub fn from_output(text: &str) -> Self {
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(pretty) => Self::Structured { value, pretty },
                Err(err) => Self::raw(text, &err),
            },
            Err(err) => Self::raw(text, &err),
        }
    }

    fn raw(text: &str, err: &serde_json::Error) -> Self {
        tracing::warn!(error = %err, "Extraction output is not valid JSON");
        Self::Raw {
            text: text.to_string(),
            notice: INCOMPLETE_NOTICE.to_string(),
        }
    }

    /// `data.json` download, only for structured output.
    pub fn download(&self) -> Option<ExportedDocument> {
        match self {
            Self::Structured { pretty, .. } => Some(ExportedDocument {
                file_name: DOWNLOAD_FILE_NAME.to_string(),
                mime_type: "application/json",
                bytes: pretty.clone().into_bytes(),
            }),
            _ => None,
        }
    }
}

pub struct TextToJsonService<B: PredictionBackend> {
    orchestrator: Arc<Orchestrator<B>>,
    prompts: Arc<PromptLibrary>,
    policy: PollPolicy,
}

impl<B: PredictionBackend> TextToJsonService<B> {
    /// `policy` is the extraction page's own, shorter poll budget.
    pub fn new(
        orchestrator: Arc<Orchestrator<B>>,
        prompts: Arc<PromptLibrary>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            orchestrator,
            prompts,
            policy,
        }
    }

    pub async fn extract(&self, session: &mut AnalysisSession, text: &str) -> ExtractionOutcome {
        let artifact = Self::artifact(text);
        session
            .sections
            .invalidate_stale(&artifact, &[SectionId::JsonExtraction]);

        let outcome = self
            .orchestrator
            .run_section_with_policy(
                session,
                SectionId::JsonExtraction,
                &artifact,
                self.policy,
                |_| self.prompts.extraction_request(text),
            )
            .await;

        match outcome {
            SectionOutcome::Generated(output) | SectionOutcome::Replayed(output) => {
                ExtractionOutcome::from_output(&output)
            }
            SectionOutcome::Failed(message) => ExtractionOutcome::Failed(message),
        }
    }

    /// Forgets the extraction so the next call generates again.
    pub fn reset(&self, session: &mut AnalysisSession) {
        session.sections.reset(SectionId::JsonExtraction);
    }

    fn artifact(text: &str) -> InputArtifact {
        if text.trim().is_empty() {
            InputArtifact::text(EXTRACTION_EXAMPLE_TEXT)
        } else {
            InputArtifact::text(text)
        }
    }
}
