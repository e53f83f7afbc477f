//! Workbook and CSV readers.

use super::{Dataset, DatasetError, DatasetSource};
use calamine::{Data, Reader, open_workbook_auto};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A contact workbook on disk.
///
/// Spreadsheet formats (`xlsx`, `xlsm`, `xlsb`, `xls`, `ods`) are read by
/// sheet name. A `csv` file has no sheets and is read whatever name is asked
/// for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookFile {
    path: PathBuf,
}

impl WorkbookFile {
    /// Wraps a path. Nothing is read until [`DatasetSource::load`].
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Workbook path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase()
    }
}

impl DatasetSource for WorkbookFile {
    fn load(&self, sheet: &str) -> Result<Dataset, DatasetError> {
        let dataset = match self.extension().as_str() {
            "csv" => read_csv(&self.path)?,
            "xlsx" | "xlsm" | "xlsb" | "xls" | "xla" | "ods" => {
                read_spreadsheet(&self.path, sheet)?
            }
            _ => return Err(DatasetError::UnsupportedFormat(self.path.clone())),
        };
        info!(
            "Loaded {} rows from {} ({sheet})",
            dataset.len(),
            self.path.display()
        );
        Ok(dataset)
    }
}

/// Picks the first candidate path that exists.
///
/// # Errors
///
/// Returns [`DatasetError::NotFound`] listing every candidate when none
/// exists.
pub fn first_existing(candidates: &[PathBuf]) -> Result<WorkbookFile, DatasetError> {
    for candidate in candidates {
        if candidate.is_file() {
            debug!("Using workbook {}", candidate.display());
            return Ok(WorkbookFile::new(candidate.clone()));
        }
        debug!("Workbook candidate missing: {}", candidate.display());
    }
    Err(DatasetError::NotFound(candidates.to_vec()))
}

fn read_spreadsheet(path: &Path, sheet: &str) -> Result<Dataset, DatasetError> {
    let mut workbook = open_workbook_auto(path)?;
    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(DatasetError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
        });
    }

    let range = workbook.worksheet_range(sheet)?;
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    Ok(Dataset::from_rows(rows))
}

/// Renders a cell the way it reads in the sheet. Whole floats lose their
/// `.0` so numeric ids and phone numbers stay recognizable.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn read_csv(path: &Path) -> Result<Dataset, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(ToString::to_string).collect());
    }
    Ok(Dataset::from_rows(rows))
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
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_csv_is_read_with_header_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "contacts.csv",
            "Fuar Adı,Firma,Ülke,Telefon,E-mail\n\
             Gulfood,Acme,UAE,123,\"a@acme.ae; b@acme.ae\"\n\
             Anuga,Beta,DE,456\n",
        );

        let dataset = WorkbookFile::new(&path).load("FuarMusteri").unwrap();
        assert_eq!(dataset.headers()[4], "E-mail");
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.cell(0, 4), "a@acme.ae; b@acme.ae");
        assert_eq!(dataset.cell(1, 4), "");
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "contacts.txt", "x");
        assert!(matches!(
            WorkbookFile::new(path).load("FuarMusteri"),
            Err(DatasetError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_first_existing_skips_missing_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let present = write_file(&dir, "local.csv", "a\n");
        let missing = dir.path().join("downloaded.xlsx");

        let found = first_existing(&[missing.clone(), present.clone()]).unwrap();
        assert_eq!(found.path(), present.as_path());

        let err = first_existing(&[missing]).unwrap_err();
        assert!(matches!(err, DatasetError::NotFound(paths) if paths.len() == 1));
    }

    #[test]
    fn test_corrupt_spreadsheet_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "contacts.xlsx", "not a zip archive");
        assert!(WorkbookFile::new(path).load("FuarMusteri").is_err());
    }

    #[test]
    fn test_cell_text_formats_whole_numbers() {
        assert_eq!(cell_text(&Data::Float(905317656960.0)), "905317656960");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::String("x".into())), "x");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
