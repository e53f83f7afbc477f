//! Sender account validation.

use super::model::SenderAccount;
use crate::address::EmailAddress;

/// Problem with the sender account configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountIssue {
    /// Sender address is empty.
    EmptyEmail,
    /// Sender address format is invalid.
    InvalidEmail,
    /// SMTP host is empty.
    EmptySmtpHost,
    /// SMTP username is empty.
    EmptySmtpUsername,
}

impl AccountIssue {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyEmail => "Sender email address is required",
            Self::InvalidEmail => "Invalid sender email address format",
            Self::EmptySmtpHost => "SMTP server is required",
            Self::EmptySmtpUsername => "SMTP username is required",
        }
    }

    /// Config key this issue relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::InvalidEmail => "account.email",
            Self::EmptySmtpHost => "account.smtp.host",
            Self::EmptySmtpUsername => "account.smtp.username",
        }
    }
}

impl std::fmt::Display for AccountIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message(), self.field())
    }
}

impl std::error::Error for AccountIssue {}

/// Checks that the account can be used to send.
///
/// # Errors
///
/// Returns every issue found, in field order.
pub fn validate_account(account: &SenderAccount) -> Result<(), Vec<AccountIssue>> {
    let mut issues = Vec::new();

    if account.email.trim().is_empty() {
        issues.push(AccountIssue::EmptyEmail);
    } else if EmailAddress::parse(&account.email).is_none() {
        issues.push(AccountIssue::InvalidEmail);
    }
    if account.smtp.host.trim().is_empty() {
        issues.push(AccountIssue::EmptySmtpHost);
    }
    if account.smtp.username.trim().is_empty() {
        issues.push(AccountIssue::EmptySmtpUsername);
    }

    if issues.is_empty() { Ok(()) } else { Err(issues) }
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
    fn test_provider_account_is_valid() {
        assert!(validate_account(&SenderAccount::with_email("export@gmail.com")).is_ok());
    }

    #[test]
    fn test_empty_account_reports_everything() {
        assert_eq!(
            validate_account(&SenderAccount::new()).unwrap_err(),
            [
                AccountIssue::EmptyEmail,
                AccountIssue::EmptySmtpHost,
                AccountIssue::EmptySmtpUsername
            ]
        );
    }

    #[test]
    fn test_invalid_email_and_unknown_host() {
        let issues = validate_account(&SenderAccount::with_email("export@localhost")).unwrap_err();
        assert_eq!(issues, [AccountIssue::InvalidEmail, AccountIssue::EmptySmtpHost]);
        assert_eq!(
            issues[1].to_string(),
            "SMTP server is required (account.smtp.host)"
        );
    }
}
