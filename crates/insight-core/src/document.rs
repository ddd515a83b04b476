//! Exportable documents.

use crate::error::Result;

/// A rendered, downloadable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Renders a titled markdown text into document bytes.
pub trait DocumentExporter: Send + Sync {
    fn render_document(&self, title: &str, text: &str) -> Result<Vec<u8>>;

    fn mime_type(&self) -> &'static str;

    fn extension(&self) -> &'static str;
}
