//! Sender account management.
//!
//! Provides the sender/SMTP settings, password lookup and validation.

pub mod credentials;
mod model;
mod validation;

pub use credentials::{CredentialError, CredentialResult};
pub use model::{Security, SenderAccount, SmtpConfig};
pub use validation::{AccountIssue, validate_account};
