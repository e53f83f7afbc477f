//! MIME content type handling.

use crate::encoding::encode_parameter;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "png").
    pub sub_type: String,
    /// Parameters (e.g., charset=utf-8, boundary=xxx), written in key order.
    pub parameters: BTreeMap<String, String>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Creates a text/plain content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// Creates a text/html content type.
    #[must_use]
    pub fn text_html() -> Self {
        Self::new("text", "html").with_parameter("charset", "utf-8")
    }

    /// Creates an application/octet-stream content type.
    #[must_use]
    pub fn octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// Creates a multipart content type (`mixed`, `related`, ...) with boundary.
    #[must_use]
    pub fn multipart(sub_type: &str, boundary: impl Into<String>) -> Self {
        Self::new("multipart", sub_type).with_parameter("boundary", boundary)
    }

    /// Guesses the content type from a filename extension.
    ///
    /// The mapping is a fixed table, so the same filename always yields the
    /// same type. Unknown extensions fall back to `application/octet-stream`.
    #[must_use]
    pub fn guess_from_filename(filename: &str) -> Self {
        let guessed = mime_guess::from_path(filename).first_or_octet_stream();
        Self::parse(guessed.essence_str()).unwrap_or_else(|_| Self::octet_stream())
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary").map(String::as_str)
    }

    /// Returns `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2=value2`
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');

        let type_str = parts.next().unwrap_or_default().trim();
        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(s.to_string()))?;
        let (main_type, sub_type) = (main_type.trim(), sub_type.trim());
        if main_type.is_empty() || sub_type.is_empty() {
            return Err(Error::InvalidContentType(s.to_string()));
        }

        let mut content_type = Self::new(main_type.to_lowercase(), sub_type.to_lowercase());
        for param in parts {
            if let Some((key, value)) = param.trim().split_once('=') {
                content_type.parameters.insert(
                    key.trim().to_lowercase(),
                    value.trim().trim_matches('"').to_string(),
                );
            }
        }

        Ok(content_type)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;

        for (key, value) in &self.parameters {
            if value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c))
                || !value.is_ascii()
            {
                write!(f, "; {}", encode_parameter(key, value))?;
            } else {
                write!(f, "; {key}={value}")?;
            }
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
    fn test_text_types_carry_charset() {
        assert_eq!(ContentType::text_plain().to_string(), "text/plain; charset=utf-8");
        assert_eq!(ContentType::text_html().to_string(), "text/html; charset=utf-8");
    }

    #[test]
    fn test_multipart_boundary_is_quoted_when_needed() {
        let ct = ContentType::multipart("mixed", "=_fairmail_1");
        assert!(ct.is_multipart());
        assert_eq!(ct.boundary(), Some("=_fairmail_1"));
        assert_eq!(ct.to_string(), "multipart/mixed; boundary=\"=_fairmail_1\"");
    }

    #[test]
    fn test_guess_from_filename() {
        assert_eq!(ContentType::guess_from_filename("catalogue.pdf").essence(), "application/pdf");
        assert_eq!(ContentType::guess_from_filename("logo.PNG").essence(), "image/png");
        assert_eq!(
            ContentType::guess_from_filename("price-list.xlsx").essence(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(
            ContentType::guess_from_filename("README").essence(),
            "application/octet-stream"
        );
        assert_eq!(
            ContentType::guess_from_filename("archive.unknownext"),
            ContentType::guess_from_filename("archive.unknownext")
        );
    }

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("Text/HTML; Charset=\"utf-8\"").unwrap();
        assert_eq!(ct.essence(), "text/html");
        assert_eq!(ct.parameters.get("charset").map(String::as_str), Some("utf-8"));

        assert!(ContentType::parse("text").is_err());
        assert!(ContentType::parse("/plain").is_err());
    }
}
