//! Data file analysis: explanation, security and visualization sections
//! over an uploaded or sample file, plus the exportable report.

use crate::orchestrator::{Orchestrator, Report, SectionPlan};
use crate::prompts::PromptLibrary;
use crate::session::AnalysisSession;
use insight_core::artifact::{FileFormat, InputArtifact};
use insight_core::document::{DocumentExporter, ExportedDocument};
use insight_core::error::{InsightError, Result};
use insight_core::prediction::PredictionBackend;
use insight_core::section::SectionId;
use insight_core::table::{Table, TabularParser};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Parsed table and the text the prompts embed.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePreview {
    pub table: Table,
    pub source: String,
}

/// Result of analyzing one file.
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub preview: TablePreview,
    pub report: Report,
    /// Only offered for complete reports on uploaded files.
    pub document: Option<ExportedDocument>,
}

pub struct FileAnalysisService<B: PredictionBackend> {
    orchestrator: Arc<Orchestrator<B>>,
    prompts: Arc<PromptLibrary>,
    parser: Arc<dyn TabularParser>,
    exporter: Arc<dyn DocumentExporter>,
    sample_dir: PathBuf,
}

impl<B: PredictionBackend> FileAnalysisService<B> {
    pub fn new(
        orchestrator: Arc<Orchestrator<B>>,
        prompts: Arc<PromptLibrary>,
        parser: Arc<dyn TabularParser>,
        exporter: Arc<dyn DocumentExporter>,
        sample_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            orchestrator,
            prompts,
            parser,
            exporter,
            sample_dir: sample_dir.into(),
        }
    }

    /// Parses `artifact` without contacting the inference service.
    pub fn preview(&self, artifact: &InputArtifact) -> Result<TablePreview> {
        let table = artifact.load(self.parser.as_ref(), &self.sample_dir)?;
        let source = artifact.preview_source(&table)?;
        Ok(TablePreview { table, source })
    }

    /// Parses `artifact` and runs every analysis section.
    ///
    /// Only loading errors are returned; section failures are part of the
    /// report.
    pub async fn analyze(
        &self,
        session: &mut AnalysisSession,
        artifact: &InputArtifact,
    ) -> Result<FileAnalysis> {
        let format = artifact
            .format()
            .ok_or_else(|| InsightError::unsupported("text input cannot be analyzed as a file"))?;
        let preview = self.preview(artifact)?;

        let report = {
            let plans = self.plans(artifact, format, &preview.source);
            self.orchestrator.run_report(session, artifact, &plans).await
        };

        let document = match report.combined_markdown() {
            Some(markdown) if !artifact.is_sample() => Some(self.export(artifact, &markdown)?),
            _ => None,
        };

        Ok(FileAnalysis {
            preview,
            report,
            document,
        })
    }

    fn plans<'a>(
        &'a self,
        artifact: &InputArtifact,
        format: FileFormat,
        source: &'a str,
    ) -> Vec<SectionPlan<'a>> {
        let explanation = if artifact.has_header() {
            SectionId::Explanation
        } else {
            SectionId::ExplanationHeaderless
        };
        let prompts = self.prompts.as_ref();

        [
            (
                explanation,
                format!("{} {}", format.label(), explanation.heading()),
            ),
            (SectionId::Security, SectionId::Security.heading().to_string()),
            (
                SectionId::Visualization,
                SectionId::Visualization.heading().to_string(),
            ),
        ]
        .into_iter()
        .map(move |(section, heading)| {
            SectionPlan::new(section, heading, move |_: &InputArtifact| {
                prompts.file_request(section, format, source)
            })
        })
        .collect()
    }

    fn export(&self, artifact: &InputArtifact, markdown: &str) -> Result<ExportedDocument> {
        let bytes = self
            .exporter
            .render_document(&artifact.identity(), markdown)?;
        Ok(ExportedDocument {
            file_name: format!(
                "data-analysis-{}.{}",
                Uuid::new_v4(),
                self.exporter.extension()
            ),
            mime_type: self.exporter.mime_type(),
            bytes,
        })
    }
}
