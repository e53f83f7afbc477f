//! Ordered header block.

use crate::error::{Error, Result};
use std::fmt;

/// Header fields in insertion order.
///
/// Order matters to humans reading raw messages and to some spam filters,
/// so headers are written exactly as added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid field name or the value
    /// contains a bare line break (header injection).
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        let value = value.into();

        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
            return Err(Error::InvalidHeader {
                name,
                reason: "field name must be printable ASCII without ':'".into(),
            });
        }
        // Folding produced by our own encoders is CRLF followed by a space.
        let unfolded = value.replace("\r\n ", "");
        if unfolded.contains(|c: char| c == '\r' || c == '\n') {
            return Err(Error::InvalidHeader {
                name,
                reason: "value contains a line break".into(),
            });
        }

        self.fields.push((name, value));
        Ok(())
    }

    /// Gets the first value for a header (case-insensitive name).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns an iterator over all headers.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.fields {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
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

    #[test]
    fn test_headers_keep_insertion_order() {
        let mut headers = Headers::new();
        headers.add("From", "export@example.com").unwrap();
        headers.add("To", "buyer@example.org").unwrap();
        headers.add("Subject", "Thanks").unwrap();

        assert_eq!(
            headers.to_string(),
            "From: export@example.com\r\nTo: buyer@example.org\r\nSubject: Thanks\r\n"
        );
    }

    #[test]
    fn test_headers_get_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain").unwrap();
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("Subject"), None);
    }

    #[test]
    fn test_header_injection_is_refused() {
        let mut headers = Headers::new();
        assert!(headers.add("Subject", "hi\r\nBcc: victim@example.org").is_err());
        assert!(headers.add("Bad Name", "x").is_err());
        assert!(headers.add("Subject", "=?utf-8?B?YQ==?=\r\n =?utf-8?B?Yg==?=").is_ok());
        assert_eq!(headers.iter().count(), 1);
    }
}
