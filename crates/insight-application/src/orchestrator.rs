//! Section generation protocol.
//!
//! A section is generated at most once per artifact: a valid record is
//! replayed, otherwise the prompt goes through the session's result cache to
//! the prediction client. Failures never escape a section; they clear the
//! cache so the next attempt reaches the remote service again.

use crate::session::AnalysisSession;
use insight_core::artifact::InputArtifact;
use insight_core::error::Result;
use insight_core::prediction::{PollPolicy, PredictionBackend, PredictionRequest};
use insight_core::section::SectionId;
use insight_interaction::PredictionClient;
use tokio_util::sync::CancellationToken;

/// Message shown when a section could not be generated.
pub const GENERATION_FAILED_MESSAGE: &str = "LLM data generation failed. Try again later.";

/// What happened to a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionOutcome {
    /// Fresh output from the model (or from the result cache).
    Generated(String),
    /// Stored output replayed without touching the cache or the network.
    Replayed(String),
    /// User-visible failure message.
    Failed(String),
}

impl SectionOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Generated(text) | Self::Replayed(text) => Some(text),
            Self::Failed(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

pub type PromptBuilder<'a> =
    Box<dyn Fn(&InputArtifact) -> Result<PredictionRequest> + Send + Sync + 'a>;

/// One section of a multi-section report.
pub struct SectionPlan<'a> {
    pub section: SectionId,
    pub heading: String,
    pub builder: PromptBuilder<'a>,
}

impl<'a> SectionPlan<'a> {
    pub fn new(
        section: SectionId,
        heading: impl Into<String>,
        builder: impl Fn(&InputArtifact) -> Result<PredictionRequest> + Send + Sync + 'a,
    ) -> Self {
        Self {
            section,
            heading: heading.into(),
            builder: Box::new(builder),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub section: SectionId,
    pub heading: String,
    pub outcome: SectionOutcome,
}

/// Outcomes of every planned section, in plan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    /// True only when every section succeeded.
    pub fn is_complete(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|entry| entry.outcome.is_success())
    }

    /// `## {heading}\n{text}` per section, separated by a blank line.
    ///
    /// `None` until the report is complete.
    pub fn combined_markdown(&self) -> Option<String> {
        if !self.is_complete() {
            return None;
        }
        let parts: Vec<String> = self
            .entries
            .iter()
            .filter_map(|entry| {
                entry
                    .outcome
                    .text()
                    .map(|text| format!("## {}\n{}", entry.heading, text))
            })
            .collect();
        Some(parts.join("\n\n"))
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|entry| !entry.outcome.is_success())
    }
}

/// Runs sections against a prediction client.
pub struct Orchestrator<B: PredictionBackend> {
    client: PredictionClient<B>,
    policy: PollPolicy,
    cancel: CancellationToken,
}

impl<B: PredictionBackend> Orchestrator<B> {
    pub fn new(client: PredictionClient<B>, policy: PollPolicy) -> Self {
        Self {
            client,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `cancel` to abort in-flight predictions.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub fn client(&self) -> &PredictionClient<B> {
        &self.client
    }

    pub async fn run_section<F>(
        &self,
        session: &mut AnalysisSession,
        section: SectionId,
        artifact: &InputArtifact,
        prompt_builder: F,
    ) -> SectionOutcome
    where
        F: FnOnce(&InputArtifact) -> Result<PredictionRequest>,
    {
        self.run_section_with_policy(session, section, artifact, self.policy, prompt_builder)
            .await
    }

    /// [`run_section`](Self::run_section) with a page-specific poll policy.
    pub async fn run_section_with_policy<F>(
        &self,
        session: &mut AnalysisSession,
        section: SectionId,
        artifact: &InputArtifact,
        policy: PollPolicy,
        prompt_builder: F,
    ) -> SectionOutcome
    where
        F: FnOnce(&InputArtifact) -> Result<PredictionRequest>,
    {
        if let Some(stored) = session.sections.output_for(section, artifact) {
            tracing::debug!(session_id = %session.id, section = %section, "Replaying stored section");
            return SectionOutcome::Replayed(stored.to_string());
        }

        let request = match prompt_builder(artifact) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(section = %section, error = %err, "Failed to build prompt");
                return SectionOutcome::Failed(err.to_string());
            }
        };

        let result = session
            .cache
            .get_or_compute(&request, || {
                self.client
                    .submit_and_await_with_cancel(&request, policy, &self.cancel)
            })
            .await;

        match result.joined_output().filter(|_| result.is_success()) {
            Some(text) => {
                tracing::info!(
                    session_id = %session.id,
                    section = %section,
                    chars = text.chars().count(),
                    "Section generated"
                );
                session.sections.record(section, artifact, text.clone());
                SectionOutcome::Generated(text)
            }
            None => {
                tracing::warn!(
                    session_id = %session.id,
                    section = %section,
                    status = ?result.status,
                    "Section generation failed"
                );
                session.cache.clear().await;
                session.sections.reset(section);
                SectionOutcome::Failed(GENERATION_FAILED_MESSAGE.to_string())
            }
        }
    }

    /// Runs every plan against `artifact`, each section on its own.
    ///
    /// Records of the planned sections that are bound to a different artifact
    /// are reset first.
    pub async fn run_report(
        &self,
        session: &mut AnalysisSession,
        artifact: &InputArtifact,
        plans: &[SectionPlan<'_>],
    ) -> Report {
        let scope: Vec<SectionId> = plans.iter().map(|plan| plan.section).collect();
        let stale = session.sections.invalidate_stale(artifact, &scope);
        if !stale.is_empty() {
            tracing::debug!(session_id = %session.id, ?stale, "Artifact changed, sections reset");
        }

        let mut report = Report::default();
        for plan in plans {
            let outcome = self
                .run_section(session, plan.section, artifact, |artifact| {
                    (plan.builder)(artifact)
                })
                .await;
            report.entries.push(ReportEntry {
                section: plan.section,
                heading: plan.heading.clone(),
                outcome,
            });
        }
        report
    }
}
