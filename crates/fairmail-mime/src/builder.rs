//! Outgoing message construction.

use crate::content_type::ContentType;
use crate::encoding::{encode_base64_lines, encode_parameter, encode_rfc2047, needs_encoding};
use crate::error::{Error, Result};
use crate::header::Headers;
use chrono::{DateTime, FixedOffset, Local};
use std::fmt;

/// Sender or recipient with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name (optional).
    pub name: Option<String>,
    /// Email address.
    pub address: String,
}

impl Mailbox {
    /// Creates a mailbox with just an address.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            name: None,
            address: address.into(),
        }
    }

    /// Creates a mailbox with a display name and address.
    #[must_use]
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            address: address.into(),
        }
    }

    /// Domain part of the address, used for message and content ids.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.address
            .rsplit_once('@')
            .map_or("localhost", |(_, domain)| domain)
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_deref().map(str::trim) {
            None | Some("") => f.write_str(&self.address),
            Some(name) if needs_encoding(name) => {
                write!(f, "{} <{}>", encode_rfc2047(name), self.address)
            }
            Some(name) if name.contains(|c: char| "()<>[]:;@\\,.\"".contains(c)) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{escaped}\" <{}>", self.address)
            }
            Some(name) => write!(f, "{name} <{}>", self.address),
        }
    }
}

/// Message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Plain text.
    Plain(String),
    /// HTML markup.
    Html(String),
}

impl Body {
    /// Returns the body text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Html(text) => text,
        }
    }

    /// Returns true for HTML bodies.
    #[must_use]
    pub const fn is_html(&self) -> bool {
        matches!(self, Self::Html(_))
    }

    fn content_type(&self) -> ContentType {
        match self {
            Self::Plain(_) => ContentType::text_plain(),
            Self::Html(_) => ContentType::text_html(),
        }
    }
}

/// Image referenced from an HTML body via `cid:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// Content id without angle brackets, as used in `src="cid:..."`.
    pub content_id: String,
    /// Filename advertised in the part headers.
    pub filename: String,
    /// Image content type.
    pub content_type: ContentType,
    /// Raw image bytes.
    pub data: Vec<u8>,
}

impl InlineImage {
    /// Creates an inline image, guessing its type from the filename.
    #[must_use]
    pub fn new(content_id: impl Into<String>, filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        Self {
            content_id: content_id.into(),
            content_type: ContentType::guess_from_filename(&filename),
            filename,
            data,
        }
    }
}

/// File attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Filename shown to the recipient.
    pub filename: String,
    /// Content type, guessed from the filename by default.
    pub content_type: ContentType,
    /// Raw file bytes.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment, guessing its type from the filename extension.
    #[must_use]
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        Self {
            content_type: ContentType::guess_from_filename(&filename),
            filename,
            data,
        }
    }

    /// Overrides the guessed content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }
}

/// One node of the MIME tree.
#[derive(Debug, Clone)]
struct Part {
    headers: Headers,
    content: Content,
}

#[derive(Debug, Clone)]
enum Content {
    /// Already transfer-encoded body.
    Leaf(String),
    Multipart { boundary: String, parts: Vec<Part> },
}

impl Part {
    fn leaf(content_type: &ContentType, data: &[u8], extra: &[(&str, String)]) -> Result<Self> {
        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string())?;
        headers.add("Content-Transfer-Encoding", "base64")?;
        for (name, value) in extra {
            headers.add(*name, value.clone())?;
        }
        Ok(Self {
            headers,
            content: Content::Leaf(encode_base64_lines(data)),
        })
    }

    fn multipart(sub_type: &str, parts: Vec<Self>) -> Result<Self> {
        let boundary = generate_boundary();
        let mut headers = Headers::new();
        headers.add(
            "Content-Type",
            ContentType::multipart(sub_type, boundary.clone()).to_string(),
        )?;
        Ok(Self {
            headers,
            content: Content::Multipart { boundary, parts },
        })
    }

    fn render(&self, out: &mut String) {
        out.push_str(&self.headers.to_string());
        out.push_str("\r\n");
        match &self.content {
            Content::Leaf(encoded) => out.push_str(encoded),
            Content::Multipart { boundary, parts } => {
                for part in parts {
                    out.push_str("--");
                    out.push_str(boundary);
                    out.push_str("\r\n");
                    part.render(out);
                }
                out.push_str("--");
                out.push_str(boundary);
                out.push_str("--\r\n");
            }
        }
    }
}

/// A composed message ready for submission.
#[derive(Debug, Clone)]
pub struct Message {
    headers: Headers,
    root: Part,
}

impl Message {
    /// Top-level message headers (without the MIME content headers).
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Serializes the message with CRLF line endings.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.headers.to_string();
        self.root.render(&mut out);
        out.into_bytes()
    }
}

/// Builder for [`Message`].
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<Mailbox>,
    to: Vec<Mailbox>,
    subject: String,
    body: Option<Body>,
    inline_images: Vec<InlineImage>,
    attachments: Vec<Attachment>,
    date: Option<DateTime<FixedOffset>>,
    message_id: Option<String>,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender.
    #[must_use]
    pub fn from(mut self, from: Mailbox) -> Self {
        self.from = Some(from);
        self
    }

    /// Adds a visible recipient.
    #[must_use]
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to.push(Mailbox::new(to));
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds an image referenced by `cid:` from an HTML body.
    #[must_use]
    pub fn inline_image(mut self, image: InlineImage) -> Self {
        self.inline_images.push(image);
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Fixes the Date header instead of using the current local time.
    #[must_use]
    pub const fn date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    /// Fixes the Message-ID (without angle brackets).
    #[must_use]
    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Builds the message.
    ///
    /// Inline images are only carried when the body is HTML; a plain body has
    /// nothing that could reference them.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender or body is missing, or a header value
    /// would break the header block.
    pub fn build(self) -> Result<Message> {
        let from = self.from.ok_or(Error::MissingField("From"))?;
        let body = self.body.ok_or(Error::MissingField("body"))?;

        let mut headers = Headers::new();
        headers.add("From", from.to_string())?;
        if self.to.is_empty() {
            headers.add("To", "undisclosed-recipients:;")?;
        } else {
            let to: Vec<String> = self.to.iter().map(ToString::to_string).collect();
            headers.add("To", to.join(", "))?;
        }
        headers.add("Subject", encode_rfc2047(self.subject.trim()))?;
        let date = self
            .date
            .unwrap_or_else(|| Local::now().fixed_offset());
        headers.add("Date", date.to_rfc2822())?;
        let message_id = self
            .message_id
            .unwrap_or_else(|| generate_message_id(from.domain()));
        headers.add("Message-ID", format!("<{message_id}>"))?;
        headers.add("MIME-Version", "1.0")?;

        let mut content = Part::leaf(&body.content_type(), body.text().as_bytes(), &[])?;

        if body.is_html() && !self.inline_images.is_empty() {
            let mut related = vec![content];
            for image in &self.inline_images {
                related.push(Part::leaf(
                    &image.content_type,
                    &image.data,
                    &[
                        ("Content-ID", format!("<{}>", image.content_id)),
                        (
                            "Content-Disposition",
                            format!("inline; {}", encode_parameter("filename", &image.filename)),
                        ),
                    ],
                )?);
            }
            content = Part::multipart("related", related)?;
        }

        if !self.attachments.is_empty() {
            let mut mixed = vec![content];
            for attachment in &self.attachments {
                mixed.push(Part::leaf(
                    &attachment.content_type,
                    &attachment.data,
                    &[(
                        "Content-Disposition",
                        format!(
                            "attachment; {}",
                            encode_parameter("filename", &attachment.filename)
                        ),
                    )],
                )?);
            }
            content = Part::multipart("mixed", mixed)?;
        }

        Ok(Message {
            headers,
            root: content,
        })
    }
}

fn random_token() -> String {
    format!("{:016x}", rand::random::<u64>())
}

fn generate_boundary() -> String {
    format!("=_fairmail_{}", random_token())
}

fn generate_message_id(domain: &str) -> String {
    format!(
        "{}.{}@{domain}",
        Local::now().timestamp_millis(),
        random_token()
    )
}

/// Generates a fresh content id (without angle brackets) for an inline part.
#[must_use]
pub fn generate_content_id(domain: &str) -> String {
    format!("logo.{}@{domain}", random_token())
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

    fn fixed_date() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc2822("Tue, 14 Oct 2025 09:30:00 +0300").unwrap()
    }

    fn render(builder: MessageBuilder) -> String {
        String::from_utf8(builder.build().unwrap().to_bytes()).unwrap()
    }

    #[test]
    fn test_mailbox_display() {
        assert_eq!(Mailbox::new("a@example.com").to_string(), "a@example.com");
        assert_eq!(
            Mailbox::with_name("Export Desk", "a@example.com").to_string(),
            "Export Desk <a@example.com>"
        );
        assert_eq!(
            Mailbox::with_name("Polat, H.", "a@example.com").to_string(),
            "\"Polat, H.\" <a@example.com>"
        );
        assert!(
            Mailbox::with_name("Hüseyin", "a@example.com")
                .to_string()
                .starts_with("=?utf-8?B?")
        );
        assert_eq!(Mailbox::new("a@example.com").domain(), "example.com");
    }

    #[test]
    fn test_simple_html_message() {
        let raw = render(
            MessageBuilder::new()
                .from(Mailbox::with_name("Export Desk", "export@example.com"))
                .to("buyer@example.org")
                .subject("Thank you for visiting our booth")
                .body(Body::Html("<p>Dear Partner,</p>".into()))
                .date(fixed_date())
                .message_id("1.abc@example.com"),
        );

        assert!(raw.starts_with(
            "From: Export Desk <export@example.com>\r\n\
             To: buyer@example.org\r\n\
             Subject: Thank you for visiting our booth\r\n\
             Date: Tue, 14 Oct 2025 09:30:00 +0300\r\n\
             Message-ID: <1.abc@example.com>\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: text/html; charset=utf-8\r\n\
             Content-Transfer-Encoding: base64\r\n\r\n"
        ));
        // "<p>Dear Partner,</p>" in base64
        assert!(raw.contains("PHA+RGVhciBQYXJ0bmVyLDwvcD4=\r\n"));
        assert!(!raw.contains("Bcc"));
    }

    #[test]
    fn test_top_level_header_names() {
        let message = MessageBuilder::new()
            .from(Mailbox::new("export@example.com"))
            .to("buyer@example.org")
            .subject("Catalogue")
            .body(Body::Plain("Hello".into()))
            .build()
            .unwrap();

        let names: Vec<&str> = message.headers().iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            ["From", "To", "Subject", "Date", "Message-ID", "MIME-Version"]
        );
    }

    #[test]
    fn test_attachments_and_inline_logo_nest_correctly() {
        let raw = render(
            MessageBuilder::new()
                .from(Mailbox::new("export@example.com"))
                .subject("Catalogue")
                .body(Body::Html("<img src=\"cid:logo.1@example.com\">".into()))
                .inline_image(InlineImage::new("logo.1@example.com", "logo.png", vec![1, 2, 3]))
                .attach(Attachment::new("catalogue.pdf", b"%PDF-1.7".to_vec()))
                .attach(Attachment::new("Fiyat Listesi.xlsx", vec![0; 4])),
        );

        assert!(raw.contains("To: undisclosed-recipients:;\r\n"));
        let mixed = raw.find("Content-Type: multipart/mixed").unwrap();
        let related = raw.find("Content-Type: multipart/related").unwrap();
        let html = raw.find("Content-Type: text/html").unwrap();
        let logo = raw.find("Content-ID: <logo.1@example.com>").unwrap();
        let pdf = raw.find("Content-Disposition: attachment; filename=\"catalogue.pdf\"").unwrap();
        assert!(mixed < related && related < html && html < logo && logo < pdf);

        assert!(raw.contains("Content-Type: image/png\r\n"));
        assert!(raw.contains("Content-Type: application/pdf\r\n"));
        assert!(raw.contains("filename=\"Fiyat Listesi.xlsx\""));
        assert!(raw.contains("Content-Disposition: inline; filename=\"logo.png\""));
    }

    #[test]
    fn test_every_opened_boundary_is_closed() {
        let message = MessageBuilder::new()
            .from(Mailbox::new("export@example.com"))
            .subject("x")
            .body(Body::Html("<p>x</p>".into()))
            .inline_image(InlineImage::new("c@example.com", "logo.png", vec![9]))
            .attach(Attachment::new("a.txt", b"a".to_vec()))
            .build()
            .unwrap();
        let raw = String::from_utf8(message.to_bytes()).unwrap();

        let boundaries: Vec<&str> = raw
            .lines()
            .filter_map(|line| line.split("boundary=\"").nth(1))
            .map(|rest| rest.trim_end_matches('"'))
            .collect();
        assert_eq!(boundaries.len(), 2);
        for boundary in boundaries {
            assert!(raw.contains(&format!("--{boundary}\r\n")));
            assert!(raw.contains(&format!("--{boundary}--\r\n")));
        }
    }

    #[test]
    fn test_inline_images_ignored_for_plain_bodies() {
        let raw = render(
            MessageBuilder::new()
                .from(Mailbox::new("export@example.com"))
                .subject("x")
                .body(Body::Plain("Dear Partner".into()))
                .inline_image(InlineImage::new("c@example.com", "logo.png", vec![9])),
        );
        assert!(!raw.contains("multipart/related"));
        assert!(raw.contains("Content-Type: text/plain; charset=utf-8"));
    }

    #[test]
    fn test_subject_is_encoded_and_trimmed() {
        let message = MessageBuilder::new()
            .from(Mailbox::new("export@example.com"))
            .subject("  Şekeroğlu fuar takibi ")
            .body(Body::Plain("x".into()))
            .build()
            .unwrap();
        let subject = message.headers().get("Subject").unwrap();
        assert!(subject.starts_with("=?utf-8?B?"));
    }

    #[test]
    fn test_missing_fields() {
        assert!(matches!(
            MessageBuilder::new().body(Body::Plain("x".into())).build(),
            Err(Error::MissingField("From"))
        ));
        assert!(matches!(
            MessageBuilder::new().from(Mailbox::new("a@example.com")).build(),
            Err(Error::MissingField("body"))
        ));
    }

    #[test]
    fn test_generated_ids_use_sender_domain() {
        let id = generate_content_id("example.com");
        assert!(id.starts_with("logo."));
        assert!(id.ends_with("@example.com"));
        assert_ne!(id, generate_content_id("example.com"));
    }
}
