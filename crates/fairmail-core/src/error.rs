//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Workbook could not be loaded.
    #[error("Dataset error: {0}")]
    Dataset(#[from] crate::dataset::DatasetError),

    /// Campaign refused before any send.
    #[error("{0}")]
    Validation(#[from] crate::delivery::ValidationError),

    /// Message could not be composed.
    #[error("Message error: {0}")]
    Mime(#[from] fairmail_mime::Error),

    /// Configuration file problem.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Credential storage error.
    #[error("Credential error: {0}")]
    Credential(#[from] crate::account::credentials::CredentialError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
