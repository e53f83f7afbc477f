//! Error types for SMTP submission.

use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error on the underlying socket.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server answered a command with a non-success reply.
    #[error("SMTP error {code}: {message}")]
    Rejected {
        /// Reply code (e.g., 550).
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// The server sent something that is not a valid SMTP reply.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Address failed envelope validation.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Envelope has no recipients.
    #[error("Envelope has no recipients")]
    EmptyEnvelope,

    /// Message exceeds the SIZE the server advertised.
    #[error("Message of {size} bytes exceeds server limit of {limit} bytes")]
    MessageTooLarge {
        /// Message size in bytes.
        size: usize,
        /// Server limit in bytes.
        limit: usize,
    },

    /// Hostname is not usable for TLS server name verification.
    #[error("Invalid TLS server name: {0}")]
    InvalidHostname(String),

    /// Server does not offer a required capability.
    #[error("Server does not support {0}")]
    NotSupported(String),
}

impl Error {
    /// Creates a rejection error from a reply code and message.
    #[must_use]
    pub fn rejected(code: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    /// Returns true if the server rejected permanently (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if the server rejected transiently (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code >= 400 && *code < 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_classification() {
        assert!(Error::rejected(550, "no such user").is_permanent());
        assert!(Error::rejected(451, "try later").is_transient());
        assert!(!Error::EmptyEnvelope.is_permanent());
    }

    #[test]
    fn rejection_display_carries_server_text() {
        let err = Error::rejected(535, "5.7.8 Username and Password not accepted");
        assert_eq!(
            err.to_string(),
            "SMTP error 535: 5.7.8 Username and Password not accepted"
        );
    }
}
