//! Section state machine.
//!
//! Every sub-report (explanation, security notes, ...) is tracked by a
//! [`SectionRecord`]. A record moves from `NotStarted` to `Done` only after a
//! successful prediction, and its stored output is only trusted while the
//! artifact it was computed for is still the active one.

use crate::artifact::InputArtifact;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::Display;

/// Independently generated sub-report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SectionId {
    Explanation,
    ExplanationHeaderless,
    Security,
    Visualization,
    CodeExplanation,
    CodeOptimization,
    CodeCostReduction,
    JsonExtraction,
}

impl SectionId {
    /// Heading used when the section is shown or exported.
    pub fn heading(self) -> &'static str {
        match self {
            Self::Explanation | Self::ExplanationHeaderless => "file data analysis",
            Self::Security => "Security issues",
            Self::Visualization => "Data visualization techniques",
            Self::CodeExplanation => "Explain the code",
            Self::CodeOptimization => "Suggest code improvements to optimize performance.",
            Self::CodeCostReduction => "Suggestions to reduce costs.",
            Self::JsonExtraction => "Transform unstructured text into JSON.",
        }
    }
}

/// Generation status of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    #[default]
    NotStarted,
    Done,
}

/// State of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub section_id: SectionId,
    pub bound_artifact_identity: Option<String>,
    pub status: SectionStatus,
    pub stored_output: Option<String>,
}

impl SectionRecord {
    pub fn new(section_id: SectionId) -> Self {
        Self {
            section_id,
            bound_artifact_identity: None,
            status: SectionStatus::NotStarted,
            stored_output: None,
        }
    }

    /// True iff the section is done and was computed for `artifact`.
    pub fn is_valid_for(&self, artifact: &InputArtifact) -> bool {
        self.status == SectionStatus::Done
            && self.bound_artifact_identity.as_deref() == Some(artifact.identity().as_str())
    }

    /// Binds a successful output to `artifact`.
    pub fn record(&mut self, artifact: &InputArtifact, output: impl Into<String>) {
        self.status = SectionStatus::Done;
        self.bound_artifact_identity = Some(artifact.identity());
        self.stored_output = Some(output.into());
    }

    pub fn reset(&mut self) {
        self.status = SectionStatus::NotStarted;
        self.bound_artifact_identity = None;
        self.stored_output = None;
    }

    /// Stored output, only if it is current for `artifact`.
    pub fn output_for(&self, artifact: &InputArtifact) -> Option<&str> {
        if self.is_valid_for(artifact) {
            self.stored_output.as_deref()
        } else {
            None
        }
    }
}

/// All section records of one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionStates {
    records: HashMap<SectionId, SectionRecord>,
}

impl SectionStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `section`, `NotStarted` if it was never touched.
    pub fn get(&self, section: SectionId) -> SectionRecord {
        self.records
            .get(&section)
            .cloned()
            .unwrap_or_else(|| SectionRecord::new(section))
    }

    pub fn is_valid_for(&self, section: SectionId, artifact: &InputArtifact) -> bool {
        self.records
            .get(&section)
            .is_some_and(|record| record.is_valid_for(artifact))
    }

    pub fn output_for(&self, section: SectionId, artifact: &InputArtifact) -> Option<&str> {
        self.records
            .get(&section)
            .and_then(|record| record.output_for(artifact))
    }

    pub fn record(&mut self, section: SectionId, artifact: &InputArtifact, output: impl Into<String>) {
        self.records
            .entry(section)
            .or_insert_with(|| SectionRecord::new(section))
            .record(artifact, output);
    }

    pub fn reset(&mut self, section: SectionId) {
        if let Some(record) = self.records.get_mut(&section) {
            record.reset();
        }
    }

    pub fn reset_all(&mut self) {
        self.records.values_mut().for_each(SectionRecord::reset);
    }

    /// Resets every record in `scope` that is bound to an artifact other than
    /// `artifact`. Sections outside `scope` belong to other inputs and are
    /// left alone.
    ///
    /// Returns the sections that were invalidated.
    pub fn invalidate_stale(&mut self, artifact: &InputArtifact, scope: &[SectionId]) -> Vec<SectionId> {
        let identity = artifact.identity();
        let mut stale: Vec<SectionId> = self
            .records
            .values_mut()
            .filter(|record| {
                scope.contains(&record.section_id)
                    && record.status == SectionStatus::Done
                    && record.bound_artifact_identity.as_deref() != Some(identity.as_str())
            })
            .map(|record| {
                record.reset();
                record.section_id
            })
            .collect();
        stale.sort();
        stale
    }

    pub fn done_count(&self) -> usize {
        self.records
            .values()
            .filter(|record| record.status == SectionStatus::Done)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::FileFormat;

    fn csv(name: &str) -> InputArtifact {
        InputArtifact::uploaded(name, FileFormat::Csv, b"a,b\n1,2".to_vec(), true)
    }

    #[test]
    fn fresh_record_is_not_valid() {
        let record = SectionRecord::new(SectionId::Explanation);
        assert!(!record.is_valid_for(&csv("a.csv")));
        assert_eq!(record.status, SectionStatus::NotStarted);
    }

    #[test]
    fn record_binds_output_to_artifact() {
        let mut record = SectionRecord::new(SectionId::Security);
        record.record(&csv("a.csv"), "no leaks");
        assert!(record.is_valid_for(&csv("a.csv")));
        assert_eq!(record.output_for(&csv("a.csv")), Some("no leaks"));
    }

    #[test]
    fn new_identity_with_same_content_is_stale() {
        let mut states = SectionStates::new();
        states.record(SectionId::Explanation, &csv("a.csv"), "text");
        assert!(!states.is_valid_for(SectionId::Explanation, &csv("b.csv")));
        assert_eq!(states.output_for(SectionId::Explanation, &csv("b.csv")), None);
    }

    #[test]
    fn invalidate_stale_resets_only_foreign_records() {
        let mut states = SectionStates::new();
        states.record(SectionId::Explanation, &csv("a.csv"), "x");
        states.record(SectionId::Security, &csv("a.csv"), "y");
        states.record(SectionId::Visualization, &csv("b.csv"), "z");
        states.record(SectionId::CodeExplanation, &InputArtifact::text("select 1"), "w");

        let scope = [SectionId::Explanation, SectionId::Security, SectionId::Visualization];
        let stale = states.invalidate_stale(&csv("b.csv"), &scope);

        assert_eq!(stale, vec![SectionId::Explanation, SectionId::Security]);
        assert!(states.is_valid_for(SectionId::Visualization, &csv("b.csv")));
        assert_eq!(states.done_count(), 2);
        assert_eq!(states.get(SectionId::Security).status, SectionStatus::NotStarted);
    }

    #[test]
    fn reset_all_clears_everything() {
        let mut states = SectionStates::new();
        states.record(SectionId::CodeExplanation, &InputArtifact::text("select 1"), "x");
        states.reset_all();
        assert_eq!(states.done_count(), 0);
        assert_eq!(states.get(SectionId::CodeExplanation).stored_output, None);
    }

    #[test]
    fn section_ids_render_snake_case() {
        assert_eq!(SectionId::CodeCostReduction.to_string(), "code_cost_reduction");
    }
}
