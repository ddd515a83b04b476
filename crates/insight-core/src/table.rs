//! Tabular data model and the parser seam.
//!
//! Parsing file formats is delegated to implementations of [`TabularParser`]
//! living in the infrastructure layer; the domain only needs a structured
//! table and a bounded text rendering of it.

use crate::artifact::FileFormat;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A parsed table. Every cell is kept in its textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Column names. Headerless CSV files get positional names (`0`, `1`, ...).
    pub columns: Vec<String>,
    /// Data rows, each padded or truncated to `columns.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the table as right-aligned, space-separated columns without an
    /// index column.
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let render = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:>width$}"))
                .collect::<Vec<_>>()
                .join(" ")
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(render(&self.columns));
        for row in &self.rows {
            lines.push(render(row));
        }
        lines.join("\n")
    }

    /// Rendered text cut to at most `max_chars` characters.
    pub fn to_text_preview(&self, max_chars: usize) -> String {
        truncate_chars(&self.to_text(), max_chars)
    }
}

/// Returns the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Turns raw bytes of a declared format into a [`Table`].
pub trait TabularParser: Send + Sync {
    fn parse(&self, bytes: &[u8], format: FileFormat, has_header: bool) -> Result<Table>;
}
