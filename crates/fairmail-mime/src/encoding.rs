//! MIME encoding utilities.
//!
//! Base64 bodies, RFC 2047 encoded-words for headers and RFC 2231 parameter
//! values for filenames.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum line length for base64 bodies (RFC 2045).
const MAX_LINE_LENGTH: usize = 76;

/// Raw bytes per RFC 2047 encoded-word. 45 bytes encode to 60 base64
/// characters, which keeps each folded header line under 78 columns.
const ENCODED_WORD_BYTES: usize = 45;

/// Encodes data as Base64 on a single line.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 wrapped into CRLF-terminated 76 column lines.
#[must_use]
pub fn encode_base64_lines(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2 + 2);

    // base64 output is ASCII, so byte chunks are char chunks.
    for chunk in encoded.as_bytes().chunks(MAX_LINE_LENGTH) {
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str("\r\n");
    }
    out
}

/// Returns true if a header value has to be encoded before it goes on the
/// wire.
#[must_use]
pub fn needs_encoding(text: &str) -> bool {
    text.contains("=?") || text.chars().any(|c| !c.is_ascii() || c.is_ascii_control())
}

/// Encodes a header value using RFC 2047 `B` encoded-words when needed.
///
/// Long values are split on character boundaries into several encoded-words
/// joined by a folding CRLF + space. ASCII values are returned unchanged.
#[must_use]
pub fn encode_rfc2047(text: &str) -> String {
    if !needs_encoding(text) {
        return text.to_string();
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for ch in text.chars() {
        if chunk.len() + ch.len_utf8() > ENCODED_WORD_BYTES {
            words.push(format!("=?utf-8?B?{}?=", encode_base64(chunk.as_bytes())));
            chunk.clear();
        }
        chunk.push(ch);
    }
    if !chunk.is_empty() {
        words.push(format!("=?utf-8?B?{}?=", encode_base64(chunk.as_bytes())));
    }

    words.join("\r\n ")
}

/// Formats a MIME parameter, switching to RFC 2231 extended notation for
/// non-ASCII values.
///
/// `param("filename", "Fiyat Listesi.pdf")` gives `filename="Fiyat Listesi.pdf"`,
/// while a name such as `Katalog_Şekeroğlu.pdf` gives
/// `filename*=utf-8''Katalog_%C5%9Eekero%C4%9Flu.pdf`.
#[must_use]
pub fn encode_parameter(name: &str, value: &str) -> String {
    if value.is_ascii() && !value.chars().any(|c| c.is_ascii_control()) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        return format!("{name}=\"{escaped}\"");
    }

    let mut encoded = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    format!("{name}*=utf-8''{encoded}")
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
    use proptest::prelude::*;

    #[test]
    fn test_base64_encode() {
        assert_eq!(encode_base64(b"Hello, World!"), "SGVsbG8sIFdvcmxkIQ==");
    }

    #[test]
    fn test_base64_lines_wrap_at_76() {
        let encoded = encode_base64_lines(&[0u8; 120]);
        let lines: Vec<&str> = encoded.split("\r\n").collect();
        // 120 bytes -> 160 base64 characters
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].len(), 76);
        assert_eq!(lines[1].len(), 76);
        assert_eq!(lines[2].len(), 8);
        assert_eq!(lines[3], "");
    }

    #[test]
    fn test_rfc2047_passthrough_for_ascii() {
        assert_eq!(
            encode_rfc2047("Follow-up from the fair"),
            "Follow-up from the fair"
        );
    }

    #[test]
    fn test_rfc2047_encodes_turkish_subject() {
        let encoded = encode_rfc2047("Şekeroğlu A.Ş.");
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert!(encoded.ends_with("?="));
        assert!(!encoded.contains("\r\n"));
    }

    #[test]
    fn test_rfc2047_splits_long_values() {
        let subject = "Teşekkürler ".repeat(10);
        let encoded = encode_rfc2047(&subject);
        let words: Vec<&str> = encoded.split("\r\n ").collect();
        assert!(words.len() > 1);
        for word in words {
            assert!(word.len() <= 75, "encoded-word too long: {word}");
        }
    }

    #[test]
    fn test_parameter_ascii_and_extended() {
        assert_eq!(
            encode_parameter("filename", "Price List.pdf"),
            "filename=\"Price List.pdf\""
        );
        assert_eq!(
            encode_parameter("filename", "Ş.pdf"),
            "filename*=utf-8''%C5%9E.pdf"
        );
    }

    proptest! {
        #[test]
        fn base64_lines_never_exceed_limit(data in proptest::collection::vec(any::<u8>(), 0..600)) {
            let encoded = encode_base64_lines(&data);
            for line in encoded.split("\r\n") {
                prop_assert!(line.len() <= MAX_LINE_LENGTH);
            }
        }
    }
}
