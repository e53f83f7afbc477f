//! Envelope addresses.

use crate::error::{Error, Result};

/// Mailbox address as used in `MAIL FROM` and `RCPT TO`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new envelope address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address has no local part, no domain, more
    /// than one `@`, or characters that would break the command line.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        let trimmed = addr.trim();

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(Error::InvalidAddress(format!("{trimmed}: missing @")));
        };
        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "{trimmed}: empty local part or domain"
            )));
        }
        if domain.contains('@') {
            return Err(Error::InvalidAddress(format!("{trimmed}: more than one @")));
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
        {
            return Err(Error::InvalidAddress(format!(
                "{trimmed}: contains whitespace or angle brackets"
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sender plus recipients of one SMTP transaction.
///
/// Recipients are envelope-only: whether they show up in the message
/// headers is decided by whoever composed the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    from: Address,
    to: Vec<Address>,
}

impl Envelope {
    /// Creates an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyEnvelope`] if `to` is empty.
    pub fn new(from: Address, to: Vec<Address>) -> Result<Self> {
        if to.is_empty() {
            return Err(Error::EmptyEnvelope);
        }
        Ok(Self { from, to })
    }

    /// Reverse-path of the transaction.
    #[must_use]
    pub const fn from(&self) -> &Address {
        &self.from
    }

    /// Forward-paths, in submission order.
    #[must_use]
    pub fn recipients(&self) -> &[Address] {
        &self.to
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
    fn test_valid_address_is_trimmed() {
        let addr = Address::new("  buyer@example.org ").unwrap();
        assert_eq!(addr.as_str(), "buyer@example.org");
        assert_eq!(addr.domain(), "example.org");
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(Address::new("").is_err());
        assert!(Address::new("buyer.example.org").is_err());
        assert!(Address::new("@example.org").is_err());
        assert!(Address::new("buyer@").is_err());
        assert!(Address::new("a@b@example.org").is_err());
        assert!(Address::new("buyer name@example.org").is_err());
        assert!(Address::new("<buyer@example.org>").is_err());
    }

    #[test]
    fn test_envelope_requires_recipient() {
        let from = Address::new("sales@example.com").unwrap();
        assert!(matches!(
            Envelope::new(from.clone(), Vec::new()),
            Err(Error::EmptyEnvelope)
        ));

        let to = vec![
            Address::new("a@example.org").unwrap(),
            Address::new("b@example.org").unwrap(),
        ];
        let envelope = Envelope::new(from, to).unwrap();
        assert_eq!(envelope.from().as_str(), "sales@example.com");
        assert_eq!(envelope.recipients().len(), 2);
        assert_eq!(envelope.recipients()[1].as_str(), "b@example.org");
    }
}
