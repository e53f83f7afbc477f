//! Sender account model types.

use fairmail_mime::Mailbox;
use serde::{Deserialize, Serialize};

/// Security/encryption mode for the SMTP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Security {
    /// No encryption (not recommended).
    None,
    /// Implicit TLS (connect directly with TLS).
    #[default]
    Tls,
    /// STARTTLS upgrade after plaintext connect.
    StartTls,
}

impl Security {
    /// Get display name for the security mode.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::None => "None (insecure)",
            Self::Tls => "SSL/TLS",
            Self::StartTls => "STARTTLS",
        }
    }
}

/// SMTP server configuration. The password is never part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Server hostname.
    pub host: String,
    /// Server port, 0 for the security mode's default.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Username for authentication.
    pub username: String,
    /// Per-message time limit in seconds. No limit when unset.
    pub timeout_secs: Option<u64>,
}

impl SmtpConfig {
    /// Get default port for the security mode.
    #[must_use]
    pub const fn default_port(security: Security) -> u16 {
        match security {
            Security::None => 25,
            Security::StartTls => 587,
            Security::Tls => 465,
        }
    }

    /// Configured port, or the default for the security mode.
    #[must_use]
    pub const fn effective_port(&self) -> u16 {
        if self.port == 0 {
            Self::default_port(self.security)
        } else {
            self.port
        }
    }
}

/// The mailbox campaigns are sent from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderAccount {
    /// Sender address, also the envelope sender.
    pub email: String,
    /// Display name in the From header.
    pub display_name: String,
    /// SMTP configuration.
    pub smtp: SmtpConfig,
}

impl SenderAccount {
    /// Create a new empty account.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create account with common defaults for well-known providers.
    #[must_use]
    pub fn with_email(email: &str) -> Self {
        let mut account = Self {
            email: email.to_string(),
            ..Default::default()
        };

        if let Some(domain) = email.split('@').nth(1) {
            let (host, security) = match domain.to_lowercase().as_str() {
                "gmail.com" | "googlemail.com" => ("smtp.gmail.com", Security::Tls),
                "outlook.com" | "hotmail.com" | "live.com" => {
                    ("smtp.office365.com", Security::StartTls)
                }
                "yahoo.com" | "ymail.com" => ("smtp.mail.yahoo.com", Security::Tls),
                "icloud.com" | "me.com" | "mac.com" => ("smtp.mail.me.com", Security::StartTls),
                _ => ("", Security::Tls),
            };
            account.smtp.host = host.to_string();
            account.smtp.security = security;
            account.smtp.port = SmtpConfig::default_port(security);
        }

        account.smtp.username = email.to_string();
        account
    }

    /// From-header mailbox.
    #[must_use]
    pub fn mailbox(&self) -> Mailbox {
        let name = self.display_name.trim();
        if name.is_empty() {
            Mailbox::new(self.email.trim())
        } else {
            Mailbox::with_name(name, self.email.trim())
        }
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

    mod security_tests {
        use super::*;

        #[test]
        fn default_is_tls() {
            assert_eq!(Security::default(), Security::Tls);
        }

        #[test]
        fn display_names() {
            assert_eq!(Security::None.display_name(), "None (insecure)");
            assert_eq!(Security::StartTls.display_name(), "STARTTLS");
        }
    }

    mod smtp_config_tests {
        use super::*;

        #[test]
        fn default_ports() {
            assert_eq!(SmtpConfig::default_port(Security::Tls), 465);
            assert_eq!(SmtpConfig::default_port(Security::StartTls), 587);
            assert_eq!(SmtpConfig::default_port(Security::None), 25);
        }

        #[test]
        fn effective_port_falls_back_to_default() {
            let mut config = SmtpConfig::default();
            assert_eq!(config.effective_port(), 465);
            config.port = 2525;
            assert_eq!(config.effective_port(), 2525);
        }
    }

    mod sender_account_tests {
        use super::*;

        #[test]
        fn with_email_gmail() {
            let account = SenderAccount::with_email("export@gmail.com");
            assert_eq!(account.smtp.host, "smtp.gmail.com");
            assert_eq!(account.smtp.port, 465);
            assert_eq!(account.smtp.security, Security::Tls);
            assert_eq!(account.smtp.username, "export@gmail.com");
        }

        #[test]
        fn with_email_outlook() {
            let account = SenderAccount::with_email("export@hotmail.com");
            assert_eq!(account.smtp.host, "smtp.office365.com");
            assert_eq!(account.smtp.port, 587);
            assert_eq!(account.smtp.security, Security::StartTls);
        }

        #[test]
        fn with_email_icloud() {
            let account = SenderAccount::with_email("export@me.com");
            assert_eq!(account.smtp.host, "smtp.mail.me.com");
        }

        #[test]
        fn with_email_unknown_domain() {
            let account = SenderAccount::with_email("export1@sekeroglugroup.com");
            assert!(account.smtp.host.is_empty());
            assert_eq!(account.smtp.port, 465);
            assert_eq!(account.smtp.username, "export1@sekeroglugroup.com");
        }

        #[test]
        fn mailbox_uses_display_name() {
            let mut account = SenderAccount::with_email("export@example.com");
            assert_eq!(account.mailbox().to_string(), "export@example.com");
            account.display_name = "Export Desk".into();
            assert_eq!(account.mailbox().to_string(), "Export Desk <export@example.com>");
        }
    }
}
