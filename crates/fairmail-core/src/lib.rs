//! # fairmail-core
//!
//! Core logic for `FairMail`, the trade-fair follow-up mailer.
//!
//! This crate provides:
//! - Address parsing for free-text spreadsheet cells
//! - Workbook loading with tolerant column resolution
//! - Recipient extraction per fair, deduplicated case-insensitively
//! - Campaign delivery, one message per recipient or a single BCC batch
//! - Sender account settings, keyring credentials and the JSON config file
//!
//! The pipeline is `Dataset -> extract -> RecipientList -> Campaign::deliver`.
//! Sending goes through the [`MailTransport`] trait, so everything above the
//! socket can be exercised without a mail server.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod address;
pub mod config;
pub mod dataset;
pub mod delivery;
mod error;
pub mod message;
pub mod recipients;
pub mod signature;
pub mod transport;

pub use account::credentials;
pub use account::{AccountIssue, Security, SenderAccount, SmtpConfig, validate_account};
pub use address::{EmailAddress, parse_cell};
pub use config::{AppConfig, ConfigError, DeliveryConfig, Operator, WorkbookConfig};
pub use dataset::{
    ColumnSpec, Dataset, DatasetError, DatasetSource, ResolvedColumns, WorkbookFile,
    resolve_columns,
};
pub use delivery::{
    Campaign, DeliveryFailure, DeliveryMode, DeliveryOutcome, ValidationError, deliver,
};
pub use error::{Error, Result};
pub use message::{Attachment, BodyFormat, CampaignMessage, Logo};
pub use recipients::{RecipientList, extract, list_fairs};
pub use signature::Signature;
pub use transport::{DryRunTransport, MailTransport, SmtpTransport, TransportError};
