//! Code dissection: explain, optimize and cost-reduce a query snippet.

use crate::orchestrator::{Orchestrator, Report, SectionOutcome, SectionPlan};
use crate::prompts::PromptLibrary;
use crate::session::AnalysisSession;
use insight_core::artifact::InputArtifact;
use insight_core::catalog::{Dialect, example_snippet};
use insight_core::prediction::PredictionBackend;
use insight_core::section::SectionId;
use std::sync::Arc;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum CodeTask {
    Explain,
    Optimize,
    ReduceCost,
}

impl CodeTask {
    pub fn section(self) -> SectionId {
        match self {
            Self::Explain => SectionId::CodeExplanation,
            Self::Optimize => SectionId::CodeOptimization,
            Self::ReduceCost => SectionId::CodeCostReduction,
        }
    }

    fn scope() -> Vec<SectionId> {
        Self::iter().map(Self::section).collect()
    }
}

/// What the user typed on the code page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeInput {
    pub dialect: Dialect,
    pub code: String,
    pub observations: String,
}

impl CodeInput {
    pub fn new(dialect: Dialect, code: impl Into<String>) -> Self {
        Self {
            dialect,
            code: code.into(),
            observations: String::new(),
        }
    }

    pub fn with_observations(mut self, observations: impl Into<String>) -> Self {
        self.observations = observations.into();
        self
    }

    /// Submitted code, or the dialect's example when nothing was typed.
    pub fn effective_code(&self) -> &str {
        if self.code.trim().is_empty() {
            example_snippet(self.dialect)
        } else {
            &self.code
        }
    }

    /// Artifact whose identity covers dialect, code and observations, so
    /// editing any of them invalidates every code section.
    pub fn artifact(&self) -> InputArtifact {
        InputArtifact::text(format!(
            "{}\n{}\n{}",
            self.dialect,
            self.effective_code(),
            self.observations.trim()
        ))
    }
}

pub struct CodeDissectionService<B: PredictionBackend> {
    orchestrator: Arc<Orchestrator<B>>,
    prompts: Arc<PromptLibrary>,
}

impl<B: PredictionBackend> CodeDissectionService<B> {
    pub fn new(orchestrator: Arc<Orchestrator<B>>, prompts: Arc<PromptLibrary>) -> Self {
        Self {
            orchestrator,
            prompts,
        }
    }

    /// Runs one task. Each task is triggered on its own.
    pub async fn generate(
        &self,
        session: &mut AnalysisSession,
        input: &CodeInput,
        task: CodeTask,
    ) -> SectionOutcome {
        let artifact = input.artifact();
        session
            .sections
            .invalidate_stale(&artifact, &CodeTask::scope());

        let section = task.section();
        self.orchestrator
            .run_section(session, section, &artifact, |_| {
                self.prompts
                    .code_request(section, input.dialect, &input.code, &input.observations)
            })
            .await
    }

    /// Runs all three tasks in page order.
    pub async fn generate_all(&self, session: &mut AnalysisSession, input: &CodeInput) -> Report {
        let artifact = input.artifact();
        let plans: Vec<SectionPlan<'_>> = CodeTask::iter()
            .map(|task| {
                let section = task.section();
                SectionPlan::new(section, section.heading(), move |_: &InputArtifact| {
                    self.prompts.code_request(
                        section,
                        input.dialect,
                        &input.code,
                        &input.observations,
                    )
                })
            })
            .collect();
        self.orchestrator.run_report(session, &artifact, &plans).await
    }
}
