//! Operator login check, run before any campaign is sent.

use anyhow::{Result, anyhow, bail};
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use fairmail_core::Operator;
use rand::RngCore;
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

/// Argon2id PHC string for a password, salted with fresh random bytes.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!("Couldn't encode salt: {e}"))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Couldn't hash password: {e}"))
}

fn password_matches(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Unreadable operator password hash: {e}");
            false
        }
    }
}

/// Checks a username/password pair against the configured operators.
pub fn verify(operators: &[Operator], username: &str, password: &str) -> bool {
    operators
        .iter()
        .filter(|op| op.username == username)
        .any(|op| password_matches(password, &op.password_hash))
}

/// Asks for operator credentials when operators are configured.
///
/// With no operators configured there is nothing to check.
pub fn require_operator(operators: &[Operator], username: Option<&str>) -> Result<()> {
    if operators.is_empty() {
        return Ok(());
    }

    let username = match username {
        Some(name) => name.to_string(),
        None => prompt("Operator: ")?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    if verify(operators, &username, &password) {
        info!("Operator {username} signed in");
        Ok(())
    } else {
        warn!("Rejected login for operator {username}");
        bail!("Invalid operator name or password")
    }
}

/// Reads one trimmed line from stdin after printing `label`.
pub fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
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

    fn operators() -> Vec<Operator> {
        vec![Operator {
            username: "huseyin".into(),
            password_hash: hash_password("secret").unwrap(),
        }]
    }

    #[test]
    fn test_hash_is_salted_phc_string() {
        let first = hash_password("secret").unwrap();
        let second = hash_password("secret").unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(password_matches("secret", &first));
        assert!(password_matches("secret", &second));
    }

    #[test]
    fn test_verify() {
        let operators = operators();
        assert!(verify(&operators, "huseyin", "secret"));
        assert!(!verify(&operators, "huseyin", "Secret"));
        assert!(!verify(&operators, "someone", "secret"));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        let operators = vec![Operator {
            username: "a".into(),
            password_hash: "ab".repeat(32),
        }];
        assert!(!verify(&operators, "a", "secret"));
    }

    #[test]
    fn test_no_operators_means_no_prompt() {
        assert!(require_operator(&[], None).is_ok());
    }
}
