//! Input artifacts: the thing currently being analyzed.
//!
//! An artifact is identified by a plain string. Identity decides whether
//! stored section results are still current; it is never a content hash, so
//! two uploads sharing a file name count as the same artifact.

use crate::error::{InsightError, Result};
use crate::table::{Table, TabularParser};
use serde::{Deserialize, Serialize};
use std::path::Path;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Supported data file formats.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum FileFormat {
    #[strum(to_string = "CSV", serialize = "csv")]
    Csv,
    #[strum(to_string = "Apache Parquet", serialize = "parquet")]
    Parquet,
    #[strum(to_string = "JSON", serialize = "json")]
    Json,
}

impl FileFormat {
    /// Human readable label used in prompts and headings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Parquet => "Apache Parquet",
            Self::Json => "JSON",
        }
    }

    /// File extensions accepted for uploads of this format.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Csv => &["csv"],
            Self::Parquet => &["parquet"],
            Self::Json => &["js", "json"],
        }
    }

    /// Bundled sample file for this format.
    pub fn sample_file_name(self) -> &'static str {
        match self {
            Self::Csv => "country_codes.csv",
            Self::Parquet => "house_price.parquet",
            Self::Json => "sample_data.json",
        }
    }

    /// Whether the uploaded bytes are text that can be embedded in a prompt as-is.
    pub fn is_textual(self) -> bool {
        !matches!(self, Self::Parquet)
    }

    /// Guesses the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::iter().find(|format| format.extensions().contains(&ext.as_str()))
    }
}

/// The user-supplied input currently being analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputArtifact {
    /// A file the user uploaded.
    Uploaded {
        name: String,
        format: FileFormat,
        bytes: Vec<u8>,
        has_header: bool,
    },
    /// One of the bundled sample files.
    Sample { format: FileFormat },
    /// Free text or a code snippet.
    Text { content: String },
}

impl InputArtifact {
    pub fn uploaded(
        name: impl Into<String>,
        format: FileFormat,
        bytes: Vec<u8>,
        has_header: bool,
    ) -> Self {
        Self::Uploaded {
            name: name.into(),
            format,
            bytes,
            has_header,
        }
    }

    pub fn sample(format: FileFormat) -> Self {
        Self::Sample { format }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Identity used for staleness checks.
    pub fn identity(&self) -> String {
        match self {
            Self::Uploaded { name, .. } => name.clone(),
            Self::Sample { format } => format!("sample-{}", format.label()),
            Self::Text { content } => content.clone(),
        }
    }

    /// Two artifacts are the same iff their identities match.
    pub fn same_identity(&self, other: &InputArtifact) -> bool {
        self.identity() == other.identity()
    }

    pub fn format(&self) -> Option<FileFormat> {
        match self {
            Self::Uploaded { format, .. } | Self::Sample { format } => Some(*format),
            Self::Text { .. } => None,
        }
    }

    pub fn is_sample(&self) -> bool {
        matches!(self, Self::Sample { .. })
    }

    /// Whether the first row names the columns. Samples always carry a header.
    pub fn has_header(&self) -> bool {
        match self {
            Self::Uploaded {
                format: FileFormat::Csv,
                has_header,
                ..
            } => *has_header,
            _ => true,
        }
    }

    /// Parses the artifact into a table.
    ///
    /// Sample artifacts are read from `sample_dir`.
    pub fn load(&self, parser: &dyn TabularParser, sample_dir: &Path) -> Result<Table> {
        match self {
            Self::Uploaded {
                format,
                bytes,
                has_header,
                ..
            } => parser.parse(bytes, *format, *has_header),
            Self::Sample { format } => {
                let path = sample_dir.join(format.sample_file_name());
                let bytes = std::fs::read(&path).map_err(|err| match err.kind() {
                    std::io::ErrorKind::NotFound => InsightError::not_found(format!(
                        "Sample file {} not found",
                        path.display()
                    )),
                    kind => InsightError::io(format!(
                        "Cannot read sample file {}: {} (kind: {:?})",
                        path.display(),
                        err,
                        kind
                    )),
                })?;
                parser.parse(&bytes, *format, true)
            }
            Self::Text { .. } => Err(InsightError::unsupported(
                "text input cannot be loaded as a table",
            )),
        }
    }

    /// Text embedded in prompts for this artifact.
    ///
    /// Uploaded CSV and JSON files contribute their raw contents; Parquet
    /// uploads and samples contribute the rendered table.
    pub fn preview_source(&self, table: &Table) -> Result<String> {
        match self {
            Self::Uploaded { format, bytes, .. } if format.is_textual() => {
                Ok(String::from_utf8(bytes.clone())?)
            }
            Self::Text { content } => Ok(content.clone()),
            _ => Ok(table.to_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoParser;

    impl TabularParser for EchoParser {
        fn parse(&self, bytes: &[u8], _format: FileFormat, has_header: bool) -> Result<Table> {
            let text = String::from_utf8_lossy(bytes).to_string();
            let columns = if has_header {
                vec!["header".to_string()]
            } else {
                vec!["0".to_string()]
            };
            Ok(Table::new(columns, vec![vec![text]]))
        }
    }

    #[test]
    fn identity_ignores_content_for_uploads() {
        let a = InputArtifact::uploaded("a.csv", FileFormat::Csv, b"x,y\n1,2".to_vec(), true);
        let b = InputArtifact::uploaded("a.csv", FileFormat::Csv, b"other".to_vec(), true);
        let c = InputArtifact::uploaded("b.csv", FileFormat::Csv, b"x,y\n1,2".to_vec(), true);
        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&c));
    }

    #[test]
    fn sample_identity_uses_format_label() {
        assert_eq!(
            InputArtifact::sample(FileFormat::Parquet).identity(),
            "sample-Apache Parquet"
        );
    }

    #[test]
    fn format_parses_from_labels_and_extensions() {
        assert_eq!("csv".parse::<FileFormat>().unwrap(), FileFormat::Csv);
        assert_eq!("JSON".parse::<FileFormat>().unwrap(), FileFormat::Json);
        assert_eq!(
            FileFormat::from_path(Path::new("data/x.JS")),
            Some(FileFormat::Json)
        );
        assert_eq!(FileFormat::from_path(Path::new("x.txt")), None);
        assert_eq!(FileFormat::Parquet.to_string(), "Apache Parquet");
    }

    #[test]
    fn headerless_flag_only_applies_to_csv() {
        let json = InputArtifact::uploaded("a.json", FileFormat::Json, vec![], false);
        let csv = InputArtifact::uploaded("a.csv", FileFormat::Csv, vec![], false);
        assert!(json.has_header());
        assert!(!csv.has_header());
    }

    #[test]
    fn missing_sample_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = InputArtifact::sample(FileFormat::Csv)
            .load(&EchoParser, dir.path())
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn unreadable_sample_is_not_reported_missing() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the file fails to read with another kind.
        std::fs::create_dir(dir.path().join("country_codes.csv")).unwrap();
        let err = InputArtifact::sample(FileFormat::Csv)
            .load(&EchoParser, dir.path())
            .unwrap_err();
        assert!(err.is_io());
        assert!(!err.is_not_found());
        assert!(!err.to_string().contains("not found"));
    }

    #[test]
    fn sample_is_read_from_sample_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("country_codes.csv"), "ES").unwrap();
        let table = InputArtifact::sample(FileFormat::Csv)
            .load(&EchoParser, dir.path())
            .unwrap();
        assert_eq!(table.rows[0][0], "ES");
    }

    #[test]
    fn preview_source_prefers_raw_text_for_textual_uploads() {
        let artifact = InputArtifact::uploaded("a.csv", FileFormat::Csv, b"a,b\n1,2".to_vec(), true);
        let table = Table::new(vec!["rendered".into()], vec![]);
        assert_eq!(artifact.preview_source(&table).unwrap(), "a,b\n1,2");

        let sample = InputArtifact::sample(FileFormat::Csv);
        assert_eq!(sample.preview_source(&table).unwrap(), "rendered");
    }

    #[test]
    fn text_cannot_be_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let err = InputArtifact::text("hello")
            .load(&EchoParser, dir.path())
            .unwrap_err();
        assert!(matches!(err, InsightError::Unsupported(_)));
    }
}
