//! Column resolution.
//!
//! Sheets are maintained by hand, so the header text drifts ("Fuar Adı",
//! "Fuar Adi", "Fair"...). Resolution is two steps: look the headers up by
//! synonym, and if either is missing fall back to fixed positions. When the
//! sheet is too narrow for the positions too, there is nothing to extract.

use super::Dataset;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How to find the fair and email columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    /// Header names accepted for the fair column.
    pub fair_synonyms: Vec<String>,
    /// Header names accepted for the email column.
    pub email_synonyms: Vec<String>,
    /// Zero-based fair column used when headers don't match.
    pub fair_position: usize,
    /// Zero-based email column used when headers don't match.
    pub email_position: usize,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            fair_synonyms: ["Fuar Adı", "Fuar Adi", "Fuar", "Fair", "Fair Name"]
                .map(String::from)
                .to_vec(),
            email_synonyms: ["E-mail", "E-Mail", "Email", "E-posta", "Mail"]
                .map(String::from)
                .to_vec(),
            fair_position: 0,
            email_position: 4,
        }
    }
}

/// Column indices to read, as found by [`resolve_columns`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    /// Fair name column.
    pub fair: usize,
    /// Email column.
    pub email: usize,
}

/// Resolves the fair and email columns of a dataset.
///
/// Header matching ignores surrounding whitespace and case. Returns `None`
/// when neither the headers nor the fallback positions work.
#[must_use]
pub fn resolve_columns(dataset: &Dataset, spec: &ColumnSpec) -> Option<ResolvedColumns> {
    let find = |synonyms: &[String]| {
        dataset.headers().iter().position(|header| {
            synonyms
                .iter()
                .any(|synonym| header.trim().eq_ignore_ascii_case(synonym.trim()))
        })
    };

    if let (Some(fair), Some(email)) = (find(&spec.fair_synonyms), find(&spec.email_synonyms)) {
        debug!("Columns resolved by header: fair={fair}, email={email}");
        return Some(ResolvedColumns { fair, email });
    }

    let columns = dataset.column_count();
    if spec.fair_position < columns && spec.email_position < columns {
        warn!(
            "Headers not recognized, using column positions fair={}, email={}",
            spec.fair_position, spec.email_position
        );
        return Some(ResolvedColumns {
            fair: spec.fair_position,
            email: spec.email_position,
        });
    }

    warn!("Sheet has {columns} columns, too few to locate fair and email");
    None
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

    fn dataset(headers: &[&str]) -> Dataset {
        Dataset::new(headers.iter().map(ToString::to_string).collect(), Vec::new())
    }

    #[test]
    fn test_headers_found_by_synonym() {
        let resolved = resolve_columns(
            &dataset(&["Firma", "E-mail", "Fuar Adı"]),
            &ColumnSpec::default(),
        );
        assert_eq!(resolved, Some(ResolvedColumns { fair: 2, email: 1 }));
    }

    #[test]
    fn test_header_match_ignores_case_and_spaces() {
        let resolved = resolve_columns(
            &dataset(&[" fair name ", "EMAIL"]),
            &ColumnSpec::default(),
        );
        assert_eq!(resolved, Some(ResolvedColumns { fair: 0, email: 1 }));
    }

    #[test]
    fn test_positional_fallback() {
        let resolved = resolve_columns(
            &dataset(&["Etkinlik", "Firma", "Ülke", "Telefon", "Adres"]),
            &ColumnSpec::default(),
        );
        assert_eq!(resolved, Some(ResolvedColumns { fair: 0, email: 4 }));
    }

    #[test]
    fn test_partial_header_match_falls_back_to_positions() {
        let resolved = resolve_columns(
            &dataset(&["Firma", "Fuar Adı", "Ülke", "Telefon", "İletişim"]),
            &ColumnSpec::default(),
        );
        assert_eq!(resolved, Some(ResolvedColumns { fair: 0, email: 4 }));
    }

    #[test]
    fn test_too_few_columns() {
        assert_eq!(
            resolve_columns(&dataset(&["Etkinlik", "Firma", "Adres"]), &ColumnSpec::default()),
            None
        );
        assert_eq!(resolve_columns(&Dataset::default(), &ColumnSpec::default()), None);
    }

    #[test]
    fn test_custom_spec() {
        let spec = ColumnSpec {
            fair_synonyms: vec!["Show".into()],
            email_synonyms: vec!["Contact".into()],
            fair_position: 1,
            email_position: 2,
        };
        assert_eq!(
            resolve_columns(&dataset(&["Contact", "Show"]), &spec),
            Some(ResolvedColumns { fair: 1, email: 0 })
        );
        assert_eq!(
            resolve_columns(&dataset(&["a", "b", "c"]), &spec),
            Some(ResolvedColumns { fair: 1, email: 2 })
        );
    }
}
