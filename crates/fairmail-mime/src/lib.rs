//! # fairmail-mime
//!
//! Composition of outgoing MIME messages.
//!
//! ## Features
//!
//! - **Bodies**: plain text or HTML, always UTF-8
//! - **Inline images**: HTML bodies can reference images by `cid:`; they are
//!   carried in a `multipart/related` wrapper
//! - **Attachments**: any bytes, content type guessed from the filename
//! - **Header encoding**: RFC 2047 for non-ASCII subjects and display names,
//!   RFC 2231 for non-ASCII attachment filenames
//!
//! Every leaf part is base64 encoded, so the output is plain 7-bit ASCII and
//! safe for any SMTP server.
//!
//! ## Example
//!
//! ```ignore
//! use fairmail_mime::{Attachment, Body, Mailbox, MessageBuilder};
//!
//! let message = MessageBuilder::new()
//!     .from(Mailbox::with_name("Export Desk", "export@example.com"))
//!     .to("buyer@example.org")
//!     .subject("Thank you for visiting our booth")
//!     .body(Body::Html("<p>Dear Partner,</p>".into()))
//!     .attach(Attachment::new("catalogue.pdf", pdf_bytes))
//!     .build()?;
//!
//! let wire_bytes = message.to_bytes();
//! ```
//!
//! Blind-copy recipients never appear here: they belong to the SMTP
//! envelope only.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod builder;
mod content_type;
mod error;
mod header;

pub mod encoding;

pub use builder::{
    Attachment, Body, InlineImage, Mailbox, Message, MessageBuilder, generate_content_id,
};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
