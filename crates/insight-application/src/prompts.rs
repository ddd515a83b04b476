//! Prompt templates for every section.
//!
//! Each [`SectionId`] owns exactly one template and one sampling temperature.
//! Data sections embed a prefix of the file preview; the prefix length
//! depends on the section.

use insight_core::artifact::FileFormat;
use insight_core::catalog::{Dialect, example_snippet};
use insight_core::error::{InsightError, Result};
use insight_core::prediction::PredictionRequest;
use insight_core::section::SectionId;
use insight_core::table::truncate_chars;
use minijinja::{Environment, context};

/// Sentence used when the extraction page is submitted without text.
pub const EXTRACTION_EXAMPLE_TEXT: &str = "Yesterday Michael bought 2 apples and 3 oranges at the store. Jenna bought 12 oranges, 4 kiwis, and 2 melons.";

const EXPLANATION: &str = "Explains this {{ format }} file and all its columns, indicates the potential uses of this data and which columns could cause problems:{{ data }}";

const EXPLANATION_HEADERLESS: &str = "Explains this {{ format }} file. Indicates what the data can be used for and what might cause problems:{{ data }}";

const SECURITY: &str = "Look for any leaks of sensitive personal data. Discuss the security issues in this {{ format }} file in Python. Select only the ones you think are relevant.{{ data }}";

const VISUALIZATION: &str = "Discuss the pros and cons of different data visualization techniques for data analysis of this {{ format }} file in Python. Select only the ones you think are relevant.{{ data }}";

const CODE_EXPLANATION: &str = "Your task is to explain the provided {{ dialect }} code snippet.\n\n{{ code }}{% if observations %} \n\nNote the following observations: {{ observations }}{% endif %}";

const CODE_OPTIMIZATION: &str = "Suggest improvements to optimize the performance of the provided {{ dialect }} code snippet.\n\n{{ code }}{% if observations %} \n\nNote the following observations: {{ observations }}{% endif %}";

const CODE_COST_REDUCTION: &str = "Suggest improvements to reduce the costs of this code provided in {{ dialect }}.\n\n{{ code }}{% if observations %} \n\nNote the following observations: {{ observations }}{% endif %}";

const JSON_EXTRACTION: &str = "Your task is to take the unstructured text provided and convert it into a well-organized table format using JSON. Identify the main entities, attributes, or categories mentioned in the text and use them as keys in the JSON object. Then, extract the relevant information from the text and populate the corresponding values in the JSON object. Ensure that the data is accurately represented and properly formatted within the JSON structure. The resulting JSON table should provide a clear, structured overview of the information presented in the original text:\n\n{{ text }}";

const TEMPLATES: [(SectionId, &str); 8] = [
    (SectionId::Explanation, EXPLANATION),
    (SectionId::ExplanationHeaderless, EXPLANATION_HEADERLESS),
    (SectionId::Security, SECURITY),
    (SectionId::Visualization, VISUALIZATION),
    (SectionId::CodeExplanation, CODE_EXPLANATION),
    (SectionId::CodeOptimization, CODE_OPTIMIZATION),
    (SectionId::CodeCostReduction, CODE_COST_REDUCTION),
    (SectionId::JsonExtraction, JSON_EXTRACTION),
];

/// Sampling temperature per section.
pub fn temperature(section: SectionId) -> f32 {
    match section {
        SectionId::Explanation | SectionId::ExplanationHeaderless => 0.2,
        SectionId::Security => 0.4,
        SectionId::Visualization => 0.9,
        SectionId::CodeExplanation => 0.2,
        SectionId::CodeOptimization | SectionId::CodeCostReduction => 0.6,
        SectionId::JsonExtraction => 0.9,
    }
}

/// How many characters of the file preview a data section embeds.
pub fn preview_limit(section: SectionId) -> usize {
    match section {
        SectionId::Explanation | SectionId::ExplanationHeaderless => 1000,
        _ => 500,
    }
}

/// Compiled prompt templates.
pub struct PromptLibrary {
    env: Environment<'static>,
}

impl PromptLibrary {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (section, source) in TEMPLATES {
            env.add_template(template_name(section), source)
                .map_err(template_error)?;
        }
        Ok(Self { env })
    }

    /// Request for one of the data-file sections.
    pub fn file_request(
        &self,
        section: SectionId,
        format: FileFormat,
        preview: &str,
    ) -> Result<PredictionRequest> {
        let data = truncate_chars(preview, preview_limit(section));
        let prompt = self.render(section, context! { format => format.label(), data => data })?;
        Ok(PredictionRequest::new(prompt, temperature(section)))
    }

    /// Request for one of the code sections. Blank `code` falls back to the
    /// dialect's example snippet.
    pub fn code_request(
        &self,
        section: SectionId,
        dialect: Dialect,
        code: &str,
        observations: &str,
    ) -> Result<PredictionRequest> {
        let code = if code.trim().is_empty() {
            example_snippet(dialect)
        } else {
            code
        };
        let prompt = self.render(
            section,
            context! {
                dialect => dialect.to_string(),
                code => code,
                observations => observations.trim(),
            },
        )?;
        Ok(PredictionRequest::new(prompt, temperature(section)))
    }

    /// Request for the text-to-JSON section. Blank `text` falls back to
    /// [`EXTRACTION_EXAMPLE_TEXT`].
    pub fn extraction_request(&self, text: &str) -> Result<PredictionRequest> {
        let text = if text.trim().is_empty() {
            EXTRACTION_EXAMPLE_TEXT
        } else {
            text
        };
        let section = SectionId::JsonExtraction;
        let prompt = self.render(section, context! { text => text })?;
        Ok(PredictionRequest::new(prompt, temperature(section)))
    }

    fn render(&self, section: SectionId, ctx: minijinja::Value) -> Result<String> {
        self.env
            .get_template(template_name(section))
            .and_then(|template| template.render(ctx))
            .map_err(template_error)
    }
}

fn template_name(section: SectionId) -> &'static str {
    match section {
        SectionId::Explanation => "explanation",
        SectionId::ExplanationHeaderless => "explanation_headerless",
        SectionId::Security => "security",
        SectionId::Visualization => "visualization",
        SectionId::CodeExplanation => "code_explanation",
        SectionId::CodeOptimization => "code_optimization",
        SectionId::CodeCostReduction => "code_cost_reduction",
        SectionId::JsonExtraction => "json_extraction",
    }
}

fn template_error(err: minijinja::Error) -> InsightError {
    InsightError::Template(err.to_string())
}
