//! Application layer for Data Insight.
//!
//! Use cases coordinating the prediction client, the per-session state and
//! the infrastructure adapters: data file analysis, code dissection and text
//! to JSON extraction.

pub mod code_dissection;
pub mod file_analysis;
pub mod orchestrator;
pub mod prompts;
pub mod result_cache;
pub mod session;
pub mod text_to_json;

pub use code_dissection::{CodeDissectionService, CodeInput, CodeTask};
pub use file_analysis::{FileAnalysis, FileAnalysisService, TablePreview};
pub use orchestrator::{
    GENERATION_FAILED_MESSAGE, Orchestrator, Report, ReportEntry, SectionOutcome, SectionPlan,
};
pub use prompts::PromptLibrary;
pub use result_cache::{FailurePolicy, ResultCache};
pub use session::{AnalysisSession, SessionRegistry};
pub use text_to_json::{ExtractionOutcome, TextToJsonService};
