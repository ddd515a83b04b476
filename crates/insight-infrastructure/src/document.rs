//! PDF report export.

use chrono::{DateTime, Local};
use insight_core::document::DocumentExporter;
use insight_core::error::{InsightError, Result};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const WRAP_COLUMNS: usize = 95;
const SEPARATOR: &str = "__________";

// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;
const PT_TO_MM: f32 = 0.3528;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineStyle {
    Date,
    FileName,
    Separator,
    Heading,
    Body,
}

impl LineStyle {
    fn font_size(self) -> f32 {
        match self {
            Self::Heading => 13.0,
            _ => 10.0,
        }
    }

    /// Vertical space taken by one line, in millimetres.
    fn advance(self) -> f32 {
        match self {
            Self::Heading => 9.0,
            Self::Separator => 8.0,
            _ => 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Line {
    style: LineStyle,
    text: String,
}

impl Line {
    fn new(style: LineStyle, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }

    fn x(&self) -> f32 {
        match self.style {
            LineStyle::Date => {
                let width = self.text.chars().count() as f32
                    * self.style.font_size()
                    * GLYPH_WIDTH
                    * PT_TO_MM;
                (PAGE_WIDTH - MARGIN - width).max(MARGIN)
            }
            _ => MARGIN,
        }
    }
}

/// Renders reports as an A4 PDF: a right-aligned timestamp, the analyzed
/// file name in italics, a separator and the report body with its markdown
/// headings set in bold.
#[derive(Debug, Clone, Default)]
pub struct PdfExporter {
    generated_at: Option<DateTime<Local>>,
}

impl PdfExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the timestamp printed in the header.
    pub fn with_timestamp(mut self, generated_at: DateTime<Local>) -> Self {
        self.generated_at = Some(generated_at);
        self
    }
}

impl DocumentExporter for PdfExporter {
    fn render_document(&self, title: &str, text: &str) -> Result<Vec<u8>> {
        let generated_at = self.generated_at.unwrap_or_else(Local::now);
        let date = generated_at.format("%Y-%m-%d - %H:%M:%S").to_string();
        let pages = paginate(layout(&date, title, text));

        let (doc, first_page, first_layer) = PdfDocument::new(
            format!("Analysis of {title}"),
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            "Layer 1".to_string(),
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let italic = doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;

        for (index, lines) in pages.iter().enumerate() {
            let (page, layer) = if index == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(
                    Mm(PAGE_WIDTH),
                    Mm(PAGE_HEIGHT),
                    format!("Layer {}", index + 1),
                )
            };
            let canvas = doc.get_page(page).get_layer(layer);

            let mut y = PAGE_HEIGHT - MARGIN;
            for line in lines {
                y -= line.style.advance();
                let font: &IndirectFontRef = match line.style {
                    LineStyle::FileName => &italic,
                    LineStyle::Heading => &bold,
                    _ => &regular,
                };
                canvas.use_text(
                    line.text.clone(),
                    line.style.font_size(),
                    Mm(line.x()),
                    Mm(y),
                    font,
                );
            }
        }

        tracing::debug!(title, pages = pages.len(), "Rendered PDF report");
        doc.save_to_bytes().map_err(pdf_error)
    }

    fn mime_type(&self) -> &'static str {
        "application/pdf"
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }
}

fn pdf_error(err: printpdf::Error) -> InsightError {
    InsightError::serialization("PDF", err.to_string())
}

/// Header lines followed by the wrapped body.
fn layout(date: &str, title: &str, text: &str) -> Vec<Line> {
    let mut lines = vec![
        Line::new(LineStyle::Date, date),
        Line::new(LineStyle::FileName, title),
        Line::new(LineStyle::Separator, SEPARATOR),
    ];

    for raw in text.lines() {
        let trimmed = raw.trim_end();
        if let Some(heading) = markdown_heading(trimmed) {
            lines.push(Line::new(LineStyle::Heading, heading));
        } else if trimmed.is_empty() {
            lines.push(Line::new(LineStyle::Body, ""));
        } else {
            lines.extend(
                textwrap::wrap(trimmed, WRAP_COLUMNS)
                    .into_iter()
                    .map(|wrapped| Line::new(LineStyle::Body, wrapped.into_owned())),
            );
        }
    }
    lines
}

fn markdown_heading(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches('#');
    (rest.len() < line.len() && rest.starts_with(' ')).then(|| rest.trim())
}

fn paginate(lines: Vec<Line>) -> Vec<Vec<Line>> {
    let usable = PAGE_HEIGHT - 2.0 * MARGIN;
    let mut pages = vec![Vec::new()];
    let mut used = 0.0;

    for line in lines {
        let advance = line.style.advance();
        if used + advance > usable && pages.last().is_some_and(|page| !page.is_empty()) {
            pages.push(Vec::new());
            used = 0.0;
        }
        used += advance;
        if let Some(page) = pages.last_mut() {
            page.push(line);
        }
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn document_is_a_pdf() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let exporter = PdfExporter::new().with_timestamp(at);

        let bytes = exporter
            .render_document("a.csv", "## CSV file data analysis\nbody")
            .unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(exporter.mime_type(), "application/pdf");
        assert_eq!(exporter.extension(), "pdf");
    }

    #[test]
    fn header_has_date_file_name_and_separator() {
        let lines = layout(
            "2024-05-01 - 09:30:00",
            "a.csv",
            "## CSV file data analysis\nbody",
        );

        assert_eq!(
            lines,
            vec![
                Line::new(LineStyle::Date, "2024-05-01 - 09:30:00"),
                Line::new(LineStyle::FileName, "a.csv"),
                Line::new(LineStyle::Separator, "__________"),
                Line::new(LineStyle::Heading, "CSV file data analysis"),
                Line::new(LineStyle::Body, "body"),
            ]
        );
        assert!(lines[0].x() > lines[1].x());
    }

    #[test]
    fn long_paragraphs_wrap() {
        let paragraph = "word ".repeat(100);
        let lines = layout("d", "t", &paragraph);
        let body: Vec<_> = lines.iter().skip(3).collect();
        assert!(body.len() > 1);
        assert!(body.iter().all(|line| line.text.chars().count() <= WRAP_COLUMNS));
    }

    #[test]
    fn long_reports_span_several_pages() {
        let text = "line\n".repeat(120);
        let pages = paginate(layout("d", "t", &text));
        assert!(pages.len() > 1);
        assert_eq!(pages[0][0].style, LineStyle::Date);
        assert_eq!(pages.iter().map(Vec::len).sum::<usize>(), 123);

        let exporter = PdfExporter::new();
        let bytes = exporter.render_document("t", &text).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn hashes_without_space_are_body_text() {
        assert_eq!(markdown_heading("### Security issues"), Some("Security issues"));
        assert_eq!(markdown_heading("#hashtag"), None);
        assert_eq!(markdown_heading("plain"), None);
    }
}
