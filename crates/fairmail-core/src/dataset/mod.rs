//! Tabular contact data.
//!
//! A [`Dataset`] is a header row plus rows of text cells, independent of the
//! file format it came from. [`WorkbookFile`] reads spreadsheets and CSV
//! exports into one; [`resolve_columns`] finds the fair and email columns.

mod columns;
mod reader;

use std::path::PathBuf;

pub use columns::{ColumnSpec, ResolvedColumns, resolve_columns};
pub use reader::{WorkbookFile, first_existing};

/// Errors raised while loading contact data.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// None of the candidate workbook paths exist.
    #[error("No workbook found (tried: {})", display_paths(.0))]
    NotFound(Vec<PathBuf>),

    /// The workbook has no sheet with the requested name.
    #[error("Sheet '{sheet}' not found in {}", .path.display())]
    SheetNotFound {
        /// Workbook path.
        path: PathBuf,
        /// Requested sheet name.
        sheet: String,
    },

    /// File extension is not a supported workbook format.
    #[error("Unsupported workbook format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Spreadsheet parsing failed.
    #[error("Couldn't read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    /// CSV parsing failed.
    #[error("Couldn't read CSV: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "no paths configured".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Anything that can produce the rows of a named sheet.
pub trait DatasetSource {
    /// Loads one sheet. A missing sheet is an error; no other sheet is tried.
    ///
    /// # Errors
    ///
    /// Returns an error if the source or sheet cannot be read.
    fn load(&self, sheet: &str) -> Result<Dataset, DatasetError>;
}

/// Header row plus data rows, every cell as trimmed text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Creates a dataset, trimming every cell.
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let trim_all = |cells: Vec<String>| -> Vec<String> {
            cells.into_iter().map(|c| c.trim().to_string()).collect()
        };
        Self {
            headers: trim_all(headers),
            rows: rows.into_iter().map(trim_all).collect(),
        }
    }

    /// Splits raw rows into a header row and data rows.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let mut rows = rows.into_iter();
        let headers = rows.next().unwrap_or_default();
        Self::new(headers, rows.collect())
    }

    /// Header cells.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows in sheet order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of columns, the wider of the header and the widest row.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when there are no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text, empty for short rows.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map_or("", String::as_str)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_from_rows_splits_header_and_trims() {
        let dataset = Dataset::from_rows(vec![
            row(&[" Fuar Adı ", "Firma", "E-mail"]),
            row(&["  Gulfood ", "Acme", " a@b.com "]),
        ]);
        assert_eq!(dataset.headers(), ["Fuar Adı", "Firma", "E-mail"]);
        assert_eq!(dataset.cell(0, 0), "Gulfood");
        assert_eq!(dataset.cell(0, 2), "a@b.com");
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let dataset = Dataset::new(row(&["A", "B"]), vec![row(&["x"])]);
        assert_eq!(dataset.cell(0, 1), "");
        assert_eq!(dataset.cell(5, 0), "");
    }

    #[test]
    fn test_column_count_uses_widest_row() {
        let dataset = Dataset::new(row(&["A"]), vec![row(&["1", "2", "3"])]);
        assert_eq!(dataset.column_count(), 3);
        assert_eq!(Dataset::default().column_count(), 0);
        assert!(Dataset::default().is_empty());
    }

    #[test]
    fn test_not_found_message_lists_paths() {
        let err = DatasetError::NotFound(vec!["a.xlsx".into(), "b.csv".into()]);
        assert_eq!(err.to_string(), "No workbook found (tried: a.xlsx, b.csv)");
    }
}
