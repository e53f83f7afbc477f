//! SMTP password lookup.
//!
//! The password is read from the `FAIRMAIL_SMTP_PASSWORD` environment
//! variable when set, otherwise from the platform's credential store:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::{debug, warn};

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "fairmail";

/// Environment variable that overrides the keyring.
pub const PASSWORD_ENV: &str = "FAIRMAIL_SMTP_PASSWORD";

/// Error type for credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// No password in the environment or the keyring.
    #[error("No SMTP password for {0}; set FAIRMAIL_SMTP_PASSWORD or run `fairmail password set`")]
    Missing(String),
}

/// Result type for credential operations.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

fn entry(account: &str) -> CredentialResult<Entry> {
    let key = format!("{SERVICE_NAME}_smtp_{}", account.to_lowercase());
    Ok(Entry::new(SERVICE_NAME, &key)?)
}

/// Stores the SMTP password for a sender address.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn store_smtp_password(account: &str, password: &str) -> CredentialResult<()> {
    entry(account)?.set_password(password)?;
    debug!("Stored SMTP password for {account}");
    Ok(())
}

/// Retrieves the SMTP password for a sender address from the keyring.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn get_smtp_password(account: &str) -> CredentialResult<Option<String>> {
    match entry(account)?.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => {
            debug!("No SMTP password found for {account}");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Deletes the stored SMTP password. A missing entry is not an error.
///
/// # Errors
///
/// Returns an error if the keyring operation fails (except for missing entries).
pub fn delete_smtp_password(account: &str) -> CredentialResult<()> {
    match entry(account)?.delete_credential() {
        Ok(()) => {
            debug!("Deleted SMTP password for {account}");
            Ok(())
        }
        Err(keyring::Error::NoEntry) => {
            debug!("No SMTP password to delete for {account}");
            Ok(())
        }
        Err(e) => {
            warn!("Failed to delete SMTP password: {e}");
            Err(e.into())
        }
    }
}

/// Resolves the password to send with: environment first, then keyring.
///
/// # Errors
///
/// Returns [`CredentialError::Missing`] if neither source has one, or the
/// keyring error if the store cannot be read.
pub fn resolve_smtp_password(account: &str) -> CredentialResult<String> {
    resolve_with(std::env::var(PASSWORD_ENV).ok(), account)
}

fn resolve_with(from_env: Option<String>, account: &str) -> CredentialResult<String> {
    if let Some(password) = from_env.filter(|p| !p.is_empty()) {
        debug!("Using SMTP password from {PASSWORD_ENV}");
        return Ok(password);
    }
    get_smtp_password(account)?.ok_or_else(|| CredentialError::Missing(account.to_string()))
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
    // Keyring tests touch the real system keyring and are ignored by default.
    // Run manually with `cargo test -- --ignored`.

    use super::*;

    #[test]
    fn test_environment_wins_without_touching_keyring() {
        let password = resolve_with(Some("from-env".into()), "export@example.com").unwrap();
        assert_eq!(password, "from-env");
    }

    #[test]
    fn test_missing_message_names_the_fix() {
        let message = CredentialError::Missing("export@example.com".into()).to_string();
        assert!(message.contains(PASSWORD_ENV));
        assert!(message.contains("export@example.com"));
    }

    #[test]
    #[ignore = "Interacts with system keyring"]
    fn test_store_retrieve_delete() {
        let account = "fairmail-test@example.invalid";
        store_smtp_password(account, "secret").unwrap();
        assert_eq!(get_smtp_password(account).unwrap(), Some("secret".into()));
        assert_eq!(resolve_with(None, account).unwrap(), "secret");

        delete_smtp_password(account).unwrap();
        assert_eq!(get_smtp_password(account).unwrap(), None);
        assert!(matches!(
            resolve_with(Some(String::new()), account),
            Err(CredentialError::Missing(_))
        ));
    }
}
