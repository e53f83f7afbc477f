//! Campaign message content and composition.

use crate::signature::Signature;
use fairmail_mime::{Body, ContentType, InlineImage, Mailbox, Message, MessageBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the body text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    /// Plain text.
    Plain,
    /// HTML markup (the usual choice, it carries the styled signature).
    #[default]
    Html,
}

/// A file sent along with every message of a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Filename shown to recipients.
    pub filename: String,
    /// File contents.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from memory.
    #[must_use]
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }

    /// Reads an attachment from disk, named after the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map_or_else(|| "attachment".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { filename, data })
    }

    /// Content type guessed from the extension.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        ContentType::guess_from_filename(&self.filename)
    }
}

/// Logo image shown in the HTML signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    /// Image filename, used to guess the image type.
    pub filename: String,
    /// Image bytes.
    pub data: Vec<u8>,
}

impl Logo {
    /// Reads a logo image from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let Attachment { filename, data } = Attachment::from_path(path)?;
        Ok(Self { filename, data })
    }
}

/// Subject, body and signature of a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignMessage {
    /// Subject line.
    pub subject: String,
    /// Body as typed by the operator.
    pub body: String,
    /// Whether `body` is plain text or HTML.
    pub format: BodyFormat,
    /// Signature appended after the body.
    pub signature: Option<Signature>,
    /// Inline logo for the HTML signature.
    pub logo: Option<Logo>,
}

impl CampaignMessage {
    /// Creates a message without signature.
    #[must_use]
    pub fn new(subject: impl Into<String>, body: impl Into<String>, format: BodyFormat) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            format,
            signature: None,
            logo: None,
        }
    }

    /// Appends a signature block.
    #[must_use]
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature).filter(|s| !s.is_empty());
        self
    }

    /// Embeds a logo in the HTML signature.
    #[must_use]
    pub fn with_logo(mut self, logo: Logo) -> Self {
        self.logo = Some(logo);
        self
    }

    /// Body with the signature appended.
    #[must_use]
    pub fn rendered_body(&self, logo_cid: Option<&str>) -> String {
        let mut body = self.body.clone();
        if let Some(signature) = &self.signature {
            match self.format {
                BodyFormat::Html => body.push_str(&signature.to_html(logo_cid)),
                BodyFormat::Plain => body.push_str(&signature.to_text()),
            }
        }
        body
    }

    /// Composes one MIME message.
    ///
    /// `to` is the visible recipient; blind copies are never written to the
    /// headers and must be added to the SMTP envelope by the caller. The logo
    /// is only embedded for HTML bodies with a signature to show it in.
    ///
    /// # Errors
    ///
    /// Returns an error if a header value cannot be encoded.
    pub fn compose(
        &self,
        from: &Mailbox,
        to: &str,
        attachments: &[Attachment],
    ) -> fairmail_mime::Result<Message> {
        let logo = self
            .logo
            .as_ref()
            .filter(|_| self.format == BodyFormat::Html && self.signature.is_some());
        let logo_cid = logo.map(|_| fairmail_mime::generate_content_id(from.domain()));

        let text = self.rendered_body(logo_cid.as_deref());
        let body = match self.format {
            BodyFormat::Html => Body::Html(text),
            BodyFormat::Plain => Body::Plain(text),
        };

        let mut builder = MessageBuilder::new()
            .from(from.clone())
            .to(to)
            .subject(self.subject.trim())
            .body(body);

        if let (Some(logo), Some(cid)) = (logo, logo_cid) {
            builder = builder.inline_image(InlineImage::new(
                cid,
                &logo.filename,
                logo.data.clone(),
            ));
        }
        for attachment in attachments {
            builder = builder.attach(
                fairmail_mime::Attachment::new(&attachment.filename, attachment.data.clone())
                    .with_content_type(attachment.content_type()),
            );
        }

        builder.build()
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

    fn sender() -> Mailbox {
        Mailbox::with_name("Export Desk", "export@example.com")
    }

    fn signature() -> Signature {
        Signature {
            name: "Huseyin POLAT".into(),
            company: "Acme".into(),
            ..Signature::default()
        }
    }

    fn raw(message: &Message) -> String {
        String::from_utf8(message.to_bytes()).unwrap()
    }

    #[test]
    fn test_rendered_body_appends_signature() {
        let html = CampaignMessage::new("s", "Dear Partner,", BodyFormat::Html)
            .with_signature(signature());
        assert!(html.rendered_body(None).starts_with("Dear Partner,<br><br>"));

        let plain = CampaignMessage::new("s", "Dear Partner,", BodyFormat::Plain)
            .with_signature(signature());
        assert_eq!(
            plain.rendered_body(None),
            "Dear Partner,\n\n-- \nHuseyin POLAT\nAcme\n"
        );
    }

    #[test]
    fn test_empty_signature_is_dropped() {
        let message =
            CampaignMessage::new("s", "body", BodyFormat::Html)
                .with_signature(Signature::default());
        assert!(message.signature.is_none());
        assert_eq!(message.rendered_body(None), "body");
    }

    #[test]
    fn test_compose_embeds_logo_for_html_signature() {
        let message = CampaignMessage::new("Thanks", "<p>Hi</p>", BodyFormat::Html)
            .with_signature(signature())
            .with_logo(Logo {
                filename: "logo.png".into(),
                data: vec![0x89, b'P', b'N', b'G'],
            });
        let composed = raw(&message.compose(&sender(), "buyer@example.org", &[]).unwrap());

        assert!(composed.contains("multipart/related"));
        assert!(composed.contains("Content-ID: <logo."));
        assert!(composed.contains("To: buyer@example.org\r\n"));
    }

    #[test]
    fn test_compose_skips_logo_without_signature_or_for_plain() {
        let logo = Logo {
            filename: "logo.png".into(),
            data: vec![1],
        };
        let no_signature =
            CampaignMessage::new("Thanks", "<p>Hi</p>", BodyFormat::Html).with_logo(logo.clone());
        let plain = CampaignMessage::new("Thanks", "Hi", BodyFormat::Plain)
            .with_signature(signature())
            .with_logo(logo);

        for message in [no_signature, plain] {
            let composed = raw(&message.compose(&sender(), "buyer@example.org", &[]).unwrap());
            assert!(!composed.contains("multipart/related"));
        }
    }

    #[test]
    fn test_compose_attaches_with_guessed_types() {
        let message = CampaignMessage::new("Thanks", "Hi", BodyFormat::Plain);
        let attachments = [
            Attachment::new("catalogue.pdf", b"%PDF".to_vec()),
            Attachment::new("notes.unknownext", b"x".to_vec()),
        ];
        let composed = raw(&message
            .compose(&sender(), "buyer@example.org", &attachments)
            .unwrap());

        assert!(composed.contains("Content-Type: multipart/mixed"));
        assert!(composed.contains("Content-Type: application/pdf\r\n"));
        assert!(composed.contains("Content-Type: application/octet-stream\r\n"));
        assert!(!composed.contains("Bcc:"));
    }

    #[test]
    fn test_attachment_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Fiyat Listesi.xlsx");
        std::fs::write(&path, b"PK").unwrap();

        let attachment = Attachment::from_path(&path).unwrap();
        assert_eq!(attachment.filename, "Fiyat Listesi.xlsx");
        assert_eq!(attachment.data, b"PK");
        assert_eq!(
            attachment.content_type().essence(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
    }
}
