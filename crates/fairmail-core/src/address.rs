//! Email address extraction from free-text cells.
//!
//! Contact sheets are filled in by hand: one cell may hold nothing, a single
//! address, or several separated by semicolons, commas, spaces or line
//! breaks. [`parse_cell`] keeps the fragments that look like an address and
//! quietly drops the rest.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[;,\s]+").expect("separator pattern is valid"));

#[allow(clippy::expect_used)]
static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("address pattern is valid")
});

/// A syntactically valid email address, casing preserved.
///
/// Two addresses are the same recipient when they are equal ignoring ASCII
/// case; see [`EmailAddress::dedup_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validates a single trimmed fragment.
    ///
    /// One enclosing `<...>` pair is removed first, so the `<addr>` half of a
    /// `Name <addr>` cell yields the bare address.
    #[must_use]
    pub fn parse(fragment: &str) -> Option<Self> {
        let fragment = fragment.trim();
        let fragment = fragment
            .strip_prefix('<')
            .and_then(|inner| inner.strip_suffix('>'))
            .unwrap_or(fragment);
        ADDRESS
            .is_match(fragment)
            .then(|| Self(fragment.to_string()))
    }

    /// Returns the address as written in the sheet.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key used for case-insensitive deduplication (ASCII case only).
    #[must_use]
    pub fn dedup_key(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extracts every valid address from one raw cell.
///
/// Fragments are split on runs of `;`, `,` and whitespace. Invalid fragments
/// are dropped without error. Exact repeats inside the cell collapse to the
/// first occurrence; case-insensitive merging happens across the whole fair
/// in [`crate::RecipientList`].
#[must_use]
pub fn parse_cell(raw: &str) -> Vec<EmailAddress> {
    let mut found: Vec<EmailAddress> = Vec::new();
    for fragment in SEPARATORS.split(raw.trim()) {
        if fragment.is_empty() {
            continue;
        }
        if let Some(address) = EmailAddress::parse(fragment)
            && !found.contains(&address)
        {
            found.push(address);
        }
    }
    found
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

    fn strings(addresses: &[EmailAddress]) -> Vec<&str> {
        addresses.iter().map(EmailAddress::as_str).collect()
    }

    #[test]
    fn test_mixed_separators() {
        let parsed = parse_cell("a@b.com; c@d.com,  e@f.co");
        assert_eq!(strings(&parsed), ["a@b.com", "c@d.com", "e@f.co"]);
    }

    #[test]
    fn test_newlines_and_tabs_separate() {
        let parsed = parse_cell("buyer@example.org\n\tsales@example.com\r\n");
        assert_eq!(strings(&parsed), ["buyer@example.org", "sales@example.com"]);
    }

    #[test]
    fn test_empty_and_whitespace_cells() {
        assert!(parse_cell("").is_empty());
        assert!(parse_cell("   \n\t ").is_empty());
        assert!(parse_cell(" ;, ").is_empty());
    }

    #[test]
    fn test_invalid_fragments_are_dropped() {
        let parsed = parse_cell("notanemail; ok@example.com, a@b, @x.com, x@.y z@y.c");
        assert_eq!(strings(&parsed), ["ok@example.com", "z@y.c"]);
    }

    #[test]
    fn test_casing_preserved_and_exact_repeats_collapse() {
        let parsed = parse_cell("Buyer@Example.org buyer@example.org Buyer@Example.org");
        assert_eq!(strings(&parsed), ["Buyer@Example.org", "buyer@example.org"]);
    }

    #[test]
    fn test_dedup_key_ignores_case() {
        let a = EmailAddress::parse("A@B.com").unwrap();
        let b = EmailAddress::parse("a@b.com").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_angle_brackets_are_unwrapped() {
        let parsed = parse_cell("Buyer <b@x.com>, a@x.com");
        assert_eq!(strings(&parsed), ["b@x.com", "a@x.com"]);

        assert_eq!(EmailAddress::parse("<A@X.com>").unwrap().as_str(), "A@X.com");
        assert!(EmailAddress::parse("<>").is_none());
        assert!(EmailAddress::parse("<@x.com>").is_none());
    }

    #[test]
    fn test_dedup_key_folds_ascii_only() {
        let address = EmailAddress::parse("Ülke@Fuar.COM").unwrap();
        assert_eq!(address.dedup_key(), "Ülke@fuar.com");
    }

    #[test]
    fn test_parse_trims() {
        assert_eq!(
            EmailAddress::parse("  a@b.com ").unwrap().as_str(),
            "a@b.com"
        );
        assert!(EmailAddress::parse("a@@b.com").is_none());
    }

    proptest! {
        #[test]
        fn parse_cell_never_panics(raw in "\\PC*") {
            let _ = parse_cell(&raw);
        }

        #[test]
        fn every_result_is_valid_and_trimmed(raw in "[a-z@.;, \\n]{0,60}") {
            for address in parse_cell(&raw) {
                prop_assert!(ADDRESS.is_match(address.as_str()));
                prop_assert_eq!(address.as_str().trim(), address.as_str());
            }
        }

        #[test]
        fn joined_valid_addresses_round_trip(
            locals in proptest::collection::vec("[a-z]{1,8}", 1..6),
            separator in "[;, \\n]{1,3}",
        ) {
            let addresses: Vec<String> = locals
                .iter()
                .enumerate()
                .map(|(i, local)| format!("{local}{i}@fair{i}.com"))
                .collect();
            let parsed = parse_cell(&addresses.join(&separator));
            prop_assert_eq!(
                strings(&parsed),
                addresses.iter().map(String::as_str).collect::<Vec<_>>()
            );
        }
    }
}
