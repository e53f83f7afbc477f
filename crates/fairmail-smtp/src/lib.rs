//! # fairmail-smtp
//!
//! Async SMTP submission client used to deliver FairMail campaigns.
//!
//! ## Features
//!
//! - **Type-state client**: a message can only be submitted once the session
//!   is authenticated (or explicitly marked as an open relay)
//! - **Transport security**: implicit TLS (port 465), STARTTLS and plain TCP
//! - **Authentication**: PLAIN and LOGIN, picked from the EHLO advertisement
//! - **Envelopes**: one sender, any number of recipients per transaction, so a
//!   single submission can fan out to a whole blind-copy list
//!
//! ## Quick Start
//!
//! ```ignore
//! use fairmail_smtp::{Address, Client, Envelope};
//! use fairmail_smtp::connection::connect_tls;
//!
//! #[tokio::main]
//! async fn main() -> fairmail_smtp::Result<()> {
//!     let stream = connect_tls("smtp.example.com", 465).await?;
//!     let mut client = Client::greet(stream).await?;
//!     client.ehlo("fairmail.local").await?;
//!
//!     let mut client = client.authenticate("sales@example.com", "app-password").await?;
//!
//!     let envelope = Envelope::new(
//!         Address::new("sales@example.com")?,
//!         vec![Address::new("buyer@example.org")?],
//!     )?;
//!     client.send_mail(&envelope, b"Subject: Hello\r\n\r\nThanks for visiting!\r\n").await?;
//!     client.quit().await
//! }
//! ```
//!
//! ## Session States
//!
//! ```text
//! ┌──────────────┐  authenticate()  ┌───────────────┐
//! │  Connected   │ ───────────────→ │ Authenticated │ ── send_mail() ──┐
//! └──────────────┘                  └───────────────┘ ←────────────────┘
//!        │ starttls() → raw stream → TLS wrap → Client::resume()
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{Authenticated, Client, Connected, ServerInfo};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Envelope, Extension, Reply, ReplyCode};
