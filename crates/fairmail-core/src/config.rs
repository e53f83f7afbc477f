//! Application configuration.
//!
//! Stored as pretty JSON at `<config dir>/fairmail/config.json`. A missing
//! file means defaults. Secrets never live here: the SMTP password comes from
//! [`crate::credentials`], operator passwords are stored as argon2 hashes.

use crate::account::SenderAccount;
use crate::address::EmailAddress;
use crate::dataset::ColumnSpec;
use crate::delivery::DeliveryMode;
use crate::message::BodyFormat;
use crate::signature::Signature;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Errors reading or writing the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written.
    #[error("{}: {source}", .path.display())]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// File is not valid config JSON.
    #[error("{}: {source}", .path.display())]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where the contact workbook comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookConfig {
    /// Candidate paths, first existing wins. Relative paths resolve against
    /// the working directory.
    pub paths: Vec<PathBuf>,
    /// Sheet holding the contacts.
    pub sheet: String,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from("fuar_temp.xlsx"), PathBuf::from("temp.xlsx")],
            sheet: "FuarMusteri".to_string(),
        }
    }
}

/// Campaign defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Mode used when `send` is not told otherwise.
    pub mode: DeliveryMode,
    /// Body format used when `send` is not told otherwise.
    pub format: BodyFormat,
    /// Addresses blind-copied on every message.
    pub archive_bcc: Vec<String>,
}

impl DeliveryConfig {
    /// Parsed archive addresses; invalid entries are skipped with a warning.
    #[must_use]
    pub fn archive_addresses(&self) -> Vec<EmailAddress> {
        self.archive_bcc
            .iter()
            .filter_map(|raw| {
                let parsed = EmailAddress::parse(raw);
                if parsed.is_none() {
                    warn!("Ignoring invalid archive BCC address '{raw}'");
                }
                parsed
            })
            .collect()
    }
}

/// Someone allowed to run campaigns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    /// Login name.
    pub username: String,
    /// Argon2 PHC string of the password (`$argon2id$v=19$...`).
    pub password_hash: String,
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Contact workbook location.
    pub workbook: WorkbookConfig,
    /// Fair and email column resolution.
    pub columns: ColumnSpec,
    /// Sender and SMTP server.
    pub account: SenderAccount,
    /// Signature appended to every body.
    pub signature: Signature,
    /// Campaign defaults.
    pub delivery: DeliveryConfig,
    /// Operators allowed to send. Empty disables the login check.
    pub operators: Vec<Operator>,
}

impl AppConfig {
    /// Default config file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fairmail")
            .join("config.json")
    }

    /// Starter config for a sender address, with provider SMTP defaults and
    /// the sender archived on every message.
    #[must_use]
    pub fn for_sender(email: &str) -> Self {
        Self {
            account: SenderAccount::with_email(email),
            delivery: DeliveryConfig {
                archive_bcc: vec![email.to_string()],
                ..DeliveryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Loads the config, or defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the config, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await.map_err(io_error)?;

        info!("Config saved to {}", path.display());
        Ok(())
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

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("config.json")).await.unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.workbook.sheet, "FuarMusteri");
        assert_eq!(config.columns.email_position, 4);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::for_sender("export@gmail.com");
        config.delivery.mode = DeliveryMode::SingleBcc;
        config.operators.push(Operator {
            username: "huseyin".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".into(),
        });
        config.save(&path).await.unwrap();

        assert_eq!(AppConfig::load(&path).await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "account": { "email": "export@example.com" }, "delivery": { "mode": "single_bcc" } }"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.account.email, "export@example.com");
        assert_eq!(config.delivery.mode, DeliveryMode::SingleBcc);
        assert_eq!(config.delivery.format, BodyFormat::Html);
        assert_eq!(config.workbook, WorkbookConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_json_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = AppConfig::load(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_archive_addresses_skip_invalid() {
        let delivery = DeliveryConfig {
            archive_bcc: vec!["export@example.com".into(), "nope".into()],
            ..DeliveryConfig::default()
        };
        let parsed = delivery.archive_addresses();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].as_str(), "export@example.com");
    }

    #[test]
    fn test_for_sender_archives_sender() {
        let config = AppConfig::for_sender("export@outlook.com");
        assert_eq!(config.delivery.archive_bcc, ["export@outlook.com"]);
        assert_eq!(config.account.smtp.host, "smtp.office365.com");
    }
}
