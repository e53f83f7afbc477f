//! Mail transports.
//!
//! Delivery only needs "submit these bytes to these envelope recipients".
//! [`SmtpTransport`] does that over a fresh SMTP session per message;
//! [`DryRunTransport`] records what would have been sent.

use crate::account::{Security, SmtpConfig};
use fairmail_smtp::connection::{connect, connect_tls, upgrade_to_tls};
use fairmail_smtp::{Client, Envelope};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

/// Errors that can occur while handing a message to the server.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection or TLS setup failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The server refused the message or a recipient.
    #[error("Send failed: {0}")]
    Send(String),

    /// The configured timeout elapsed.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Something that can submit one message.
pub trait MailTransport {
    /// Submits `message` to every envelope recipient.
    fn send(
        &mut self,
        envelope: &Envelope,
        message: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Submits over SMTP, one session per message.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    config: SmtpConfig,
    password: String,
}

/// Name announced in EHLO.
const CLIENT_HOSTNAME: &str = "localhost";

impl SmtpTransport {
    /// Creates a transport. The password comes from the credential store.
    #[must_use]
    pub fn new(config: SmtpConfig, password: impl Into<String>) -> Self {
        Self {
            config,
            password: password.into(),
        }
    }

    async fn submit(&self, envelope: &Envelope, message: &[u8]) -> Result<(), TransportError> {
        let host = self.config.host.as_str();
        let port = self.config.effective_port();
        debug!("Opening SMTP session to {host}:{port} ({})", self.config.security.display_name());

        match self.config.security {
            Security::Tls => {
                let stream = connect_tls(host, port).await.map_err(connection_error)?;
                let client = Client::greet(stream).await.map_err(connection_error)?;
                self.finish(client, envelope, message).await
            }
            Security::StartTls => {
                let stream = connect(host, port).await.map_err(connection_error)?;
                let mut client = Client::greet(stream).await.map_err(connection_error)?;
                client.ehlo(CLIENT_HOSTNAME).await.map_err(connection_error)?;
                let (stream, server_info) = client.starttls().await.map_err(connection_error)?;
                let stream = upgrade_to_tls(stream, host)
                    .await
                    .map_err(connection_error)?;
                let client = Client::resume(stream, server_info);
                self.finish(client, envelope, message).await
            }
            Security::None => {
                let stream = connect(host, port).await.map_err(connection_error)?;
                let client = Client::greet(stream).await.map_err(connection_error)?;
                self.finish(client, envelope, message).await
            }
        }
    }

    /// EHLO, AUTH, the mail transaction and QUIT on an established stream.
    async fn finish<S: AsyncRead + AsyncWrite + Unpin>(
        &self,
        mut client: Client<S>,
        envelope: &Envelope,
        message: &[u8],
    ) -> Result<(), TransportError> {
        client.ehlo(CLIENT_HOSTNAME).await.map_err(connection_error)?;

        let mut client = if self.password.is_empty() {
            client.without_auth()
        } else {
            client
                .authenticate(&self.config.username, &self.password)
                .await
                .map_err(|e| TransportError::Authentication(e.to_string()))?
        };

        client
            .send_mail(envelope, message)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;

        // The message is accepted at this point; a failed QUIT changes nothing.
        if let Err(e) = client.quit().await {
            debug!("QUIT failed after successful send: {e}");
        }
        Ok(())
    }
}

fn connection_error(e: fairmail_smtp::Error) -> TransportError {
    TransportError::Connection(e.to_string())
}

impl MailTransport for SmtpTransport {
    async fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<(), TransportError> {
        match self.config.timeout_secs {
            Some(secs) => {
                let limit = Duration::from_secs(secs);
                tokio::time::timeout(limit, self.submit(envelope, message))
                    .await
                    .map_err(|_| TransportError::Timeout(limit))?
            }
            None => self.submit(envelope, message).await,
        }
    }
}

/// Envelope and size of a message that was not sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunRecord {
    /// Envelope sender.
    pub from: String,
    /// Envelope recipients, visible and blind alike.
    pub recipients: Vec<String>,
    /// Size of the composed message in bytes.
    pub size: usize,
}

/// Logs and records submissions instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct DryRunTransport {
    records: Vec<DryRunRecord>,
}

impl DryRunTransport {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything "sent" so far.
    #[must_use]
    pub fn records(&self) -> &[DryRunRecord] {
        &self.records
    }
}

impl MailTransport for DryRunTransport {
    async fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<(), TransportError> {
        let record = DryRunRecord {
            from: envelope.from().to_string(),
            recipients: envelope.recipients().iter().map(ToString::to_string).collect(),
            size: message.len(),
        };
        info!(
            "[dry run] {} -> {} ({} bytes)",
            record.from,
            record.recipients.join(", "),
            record.size
        );
        self.records.push(record);
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
    use fairmail_smtp::Address;

    fn envelope() -> Envelope {
        Envelope::new(
            Address::new("export@example.com").unwrap(),
            vec![
                Address::new("buyer@example.org").unwrap(),
                Address::new("archive@example.com").unwrap(),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_dry_run_records_envelope() {
        let mut transport = DryRunTransport::new();
        transport.send(&envelope(), b"Subject: x\r\n\r\nbody").await.unwrap();

        assert_eq!(
            transport.records(),
            [DryRunRecord {
                from: "export@example.com".into(),
                recipients: vec!["buyer@example.org".into(), "archive@example.com".into()],
                size: 18,
            }]
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_a_connection_error() {
        // Port 1 on loopback is never an SMTP server.
        let config = SmtpConfig {
            host: "127.0.0.1".into(),
            port: 1,
            security: Security::None,
            username: "export@example.com".into(),
            timeout_secs: Some(5),
        };
        let mut transport = SmtpTransport::new(config, "secret");
        let err = transport.send(&envelope(), b"x").await.unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TransportError::Send("550 mailbox unavailable".into()).to_string(),
            "Send failed: 550 mailbox unavailable"
        );
        assert_eq!(
            TransportError::Timeout(Duration::from_secs(30)).to_string(),
            "Timed out after 30s"
        );
    }
}
