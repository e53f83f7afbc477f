//! SMTP reply types.

use crate::error::{Error, Result};

/// SMTP reply from server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code (e.g., 250).
    pub code: ReplyCode,
    /// Reply text, one entry per line.
    pub lines: Vec<String>,
}

impl Reply {
    /// Creates a new reply.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec is not const-compatible
    pub fn new(code: ReplyCode, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns the full reply text as a single string.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Converts the reply into an error unless it carries `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] with the server text on any other code.
    pub fn expect_code(self, expected: ReplyCode) -> Result<Self> {
        if self.code == expected {
            Ok(self)
        } else {
            Err(Error::rejected(self.code.as_u16(), self.text()))
        }
    }

    /// Converts the reply into an error unless it is 2xx.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] with the server text on a non-2xx code.
    pub fn expect_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::rejected(self.code.as_u16(), self.text()))
        }
    }
}

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 235 Authentication succeeded
    pub const AUTH_SUCCESS: Self = Self(235);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 334 Continue with authentication
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);

    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
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
    fn expect_success_passes_2xx() {
        let reply = Reply::new(ReplyCode::OK, vec!["2.1.0 OK".to_string()]);
        assert!(reply.expect_success().is_ok());
    }

    #[test]
    fn expect_success_turns_5xx_into_rejection() {
        let reply = Reply::new(
            ReplyCode::new(550),
            vec!["5.1.1 The email account".to_string(), "does not exist".to_string()],
        );
        let err = reply.expect_success().unwrap_err();
        match err {
            Error::Rejected { code, message } => {
                assert_eq!(code, 550);
                assert_eq!(message, "5.1.1 The email account\ndoes not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn expect_code_is_exact() {
        let reply = Reply::new(ReplyCode::OK, vec![]);
        assert!(reply.clone().expect_code(ReplyCode::OK).is_ok());
        assert!(reply.expect_code(ReplyCode::START_DATA).is_err());
    }

    #[test]
    fn display_code() {
        assert_eq!(ReplyCode::START_DATA.to_string(), "354");
        assert!(!ReplyCode::AUTH_CONTINUE.is_success());
        assert!(ReplyCode::AUTH_SUCCESS.is_success());
    }
}
