//! Type-state SMTP client.

use super::ServerInfo;
use crate::command::{Command, encode_data};
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{AuthMechanism, Envelope, Extension, Reply, ReplyCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashSet;
use std::marker::PhantomData;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

/// Type-state marker: greeted, not yet authenticated.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker: allowed to submit mail.
#[derive(Debug)]
pub struct Authenticated;

/// SMTP client over any byte stream.
///
/// The stream is usually a `TcpStream` or a TLS stream, but anything
/// implementing `AsyncRead + AsyncWrite` works.
#[derive(Debug)]
pub struct Client<S, State = Connected> {
    stream: BufReader<S>,
    server_info: ServerInfo,
    _state: PhantomData<State>,
}

impl<S, State> Client<S, State> {
    /// Returns what the server told us about itself.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    fn transition<Next>(self) -> Client<S, Next> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        }
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S, Connected> {
    /// Wraps a fresh connection and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting cannot be read or is not 220.
    pub async fn greet(stream: S) -> Result<Self> {
        let mut client = Self::resume(stream, ServerInfo::default());
        let greeting = client.read_reply().await?;
        let greeting = greeting.expect_code(ReplyCode::SERVICE_READY)?;

        client.server_info.hostname = greeting
            .lines
            .first()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();
        debug!("Greeted by {}", client.server_info.hostname);

        Ok(client)
    }

    /// Wraps a stream that is already past the greeting.
    ///
    /// Used after a STARTTLS upgrade, where the server does not greet again.
    /// Call [`Client::ehlo`] next: extensions from before the upgrade are
    /// discarded.
    #[must_use]
    pub fn resume(stream: S, server_info: ServerInfo) -> Self {
        Self {
            stream: BufReader::new(stream),
            server_info: ServerInfo {
                hostname: server_info.hostname,
                extensions: HashSet::new(),
            },
            _state: PhantomData,
        }
    }

    /// Sends EHLO and records the advertised extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects EHLO.
    pub async fn ehlo(&mut self, client_hostname: &str) -> Result<()> {
        let reply = self
            .send_command(Command::Ehlo {
                hostname: client_hostname.to_string(),
            })
            .await?
            .expect_success()?;

        // First line is the server's greeting text, the rest are keywords.
        self.server_info.extensions = reply
            .lines
            .iter()
            .skip(1)
            .map(|line| Extension::parse(line))
            .collect();
        Ok(())
    }

    /// Issues STARTTLS and hands back the raw stream for the TLS handshake.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS was not advertised or the server refuses.
    pub async fn starttls(mut self) -> Result<(S, ServerInfo)> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        self.send_command(Command::StartTls)
            .await?
            .expect_code(ReplyCode::SERVICE_READY)?;

        Ok((self.stream.into_inner(), self.server_info))
    }

    /// Authenticates with the best mechanism the server offers.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the credentials.
    pub async fn authenticate(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let mechanism = AuthMechanism::negotiate(&self.server_info.auth_mechanisms());
        debug!("Authenticating as {username} with {}", mechanism.as_str());

        match mechanism {
            AuthMechanism::Plain => self.auth_plain(username, password).await?,
            AuthMechanism::Login => self.auth_login(username, password).await?,
        }

        Ok(self.transition())
    }

    /// Skips authentication, for relays that accept mail from our network.
    #[must_use]
    pub fn without_auth(self) -> Client<S, Authenticated> {
        self.transition()
    }

    async fn auth_plain(&mut self, username: &str, password: &str) -> Result<()> {
        // PLAIN response: \0username\0password
        let credentials = format!("\0{username}\0{password}");
        self.send_command(Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some(STANDARD.encode(credentials.as_bytes())),
        })
        .await?
        .expect_success()?;
        Ok(())
    }

    async fn auth_login(&mut self, username: &str, password: &str) -> Result<()> {
        self.send_command(Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: None,
        })
        .await?
        .expect_code(ReplyCode::AUTH_CONTINUE)?;

        self.send_command(Command::AuthContinue(STANDARD.encode(username)))
            .await?
            .expect_code(ReplyCode::AUTH_CONTINUE)?;

        self.send_command(Command::AuthContinue(STANDARD.encode(password)))
            .await?
            .expect_success()?;
        Ok(())
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S, Authenticated> {
    /// Runs one complete mail transaction: MAIL FROM, RCPT TO for every
    /// envelope recipient, DATA and the message itself.
    ///
    /// The transaction is all-or-nothing: if any recipient is refused the
    /// transaction is reset and nothing is submitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the message exceeds the server's SIZE limit or the
    /// server rejects any step.
    pub async fn send_mail(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        let size = message.len();
        if let Some(limit) = self.server_info.max_message_size()
            && size > limit
        {
            return Err(Error::MessageTooLarge { size, limit });
        }
        let advertise_size = self
            .server_info
            .extensions
            .iter()
            .any(|ext| matches!(ext, Extension::Size(_)));

        self.send_command(Command::MailFrom {
            from: envelope.from().clone(),
            size: advertise_size.then_some(size),
        })
        .await?
        .expect_success()?;

        for to in envelope.recipients() {
            let reply = self.send_command(Command::RcptTo { to: to.clone() }).await?;
            if let Err(err) = reply.expect_success() {
                debug!("Recipient {to} refused, resetting transaction");
                self.send_command(Command::Rset).await?;
                return Err(err);
            }
        }

        self.send_command(Command::Data)
            .await?
            .expect_code(ReplyCode::START_DATA)?;

        self.write(&encode_data(message)).await?;
        self.read_reply().await?.expect_success()?;

        debug!(
            "Submitted {size} bytes to {} recipient(s)",
            envelope.recipients().len()
        );
        Ok(())
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin, State> Client<S, State> {
    /// Sends QUIT and closes the session (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        self.send_command(Command::Quit).await?.expect_success()?;
        Ok(())
    }

    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        if cmd.is_sensitive() {
            debug!("C: <credentials>");
        } else {
            debug!("C: {}", String::from_utf8_lossy(&cmd.serialize()).trim_end());
        }
        self.write(&cmd.serialize()).await?;
        self.read_reply().await
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let inner = self.stream.get_mut();
        inner.write_all(data).await?;
        inner.flush().await?;
        Ok(())
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            if self.stream.read_line(&mut line).await? == 0 {
                return Err(Error::Protocol("Connection closed by server".into()));
            }
            let line = line.trim_end().to_string();
            if line.is_empty() {
                continue;
            }

            let is_last = is_last_reply_line(&line);
            lines.push(line);
            if is_last {
                break;
            }
        }

        let reply = parse_reply(&lines)?;
        debug!("S: {} {}", reply.code, reply.text());
        Ok(reply)
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
    use crate::types::Address;
    use tokio_test::io::Builder;

    fn envelope(to: &[&str]) -> Envelope {
        Envelope::new(
            Address::new("sales@example.com").unwrap(),
            to.iter().map(|a| Address::new(*a).unwrap()).collect(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn plain_auth_and_multi_recipient_submission() {
        let mock = Builder::new()
            .read(b"220 mx.example.com ESMTP ready\r\n")
            .write(b"EHLO fairmail.local\r\n")
            .read(b"250-mx.example.com greets you\r\n250-SIZE 1000\r\n250 AUTH PLAIN LOGIN\r\n")
            .write(b"AUTH PLAIN AHNhbGVzQGV4YW1wbGUuY29tAHNlY3JldA==\r\n")
            .read(b"235 2.7.0 Accepted\r\n")
            .write(b"MAIL FROM:<sales@example.com> SIZE=22\r\n")
            .read(b"250 2.1.0 OK\r\n")
            .write(b"RCPT TO:<a@example.org>\r\n")
            .read(b"250 2.1.5 OK\r\n")
            .write(b"RCPT TO:<b@example.org>\r\n")
            .read(b"250 2.1.5 OK\r\n")
            .write(b"DATA\r\n")
            .read(b"354 Go ahead\r\n")
            .write(b"Subject: hi\r\n\r\nhello\r\n.\r\n")
            .read(b"250 2.0.0 OK queued\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 2.0.0 closing connection\r\n")
            .build();

        let mut client = Client::greet(mock).await.unwrap();
        assert_eq!(client.server_info().hostname, "mx.example.com");

        client.ehlo("fairmail.local").await.unwrap();
        assert_eq!(client.server_info().max_message_size(), Some(1000));

        let mut client = client.authenticate("sales@example.com", "secret").await.unwrap();
        client
            .send_mail(
                &envelope(&["a@example.org", "b@example.org"]),
                b"Subject: hi\r\n\r\nhello\r\n",
            )
            .await
            .unwrap();
        client.quit().await.unwrap();
    }

    #[tokio::test]
    async fn login_auth_when_plain_not_offered() {
        let mock = Builder::new()
            .read(b"220 relay.example.net\r\n")
            .write(b"EHLO fairmail.local\r\n")
            .read(b"250-relay.example.net\r\n250 AUTH LOGIN\r\n")
            .write(b"AUTH LOGIN\r\n")
            .read(b"334 VXNlcm5hbWU6\r\n")
            .write(b"c2FsZXNAZXhhbXBsZS5jb20=\r\n")
            .read(b"334 UGFzc3dvcmQ6\r\n")
            .write(b"c2VjcmV0\r\n")
            .read(b"235 Authentication successful\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();

        let mut client = Client::greet(mock).await.unwrap();
        client.ehlo("fairmail.local").await.unwrap();
        let client = client.authenticate("sales@example.com", "secret").await.unwrap();
        client.quit().await.unwrap();
    }

    #[tokio::test]
    async fn rejected_credentials_surface_server_text() {
        let mock = Builder::new()
            .read(b"220 mx.example.com ESMTP\r\n")
            .write(b"EHLO fairmail.local\r\n")
            .read(b"250-mx.example.com\r\n250 AUTH PLAIN\r\n")
            .write(b"AUTH PLAIN AHNhbGVzQGV4YW1wbGUuY29tAHNlY3JldA==\r\n")
            .read(b"535 5.7.8 Username and Password not accepted\r\n")
            .build();

        let mut client = Client::greet(mock).await.unwrap();
        client.ehlo("fairmail.local").await.unwrap();
        let err = client
            .authenticate("sales@example.com", "secret")
            .await
            .unwrap_err();
        assert!(err.is_permanent());
        assert!(err.to_string().contains("Username and Password not accepted"));
    }

    #[tokio::test]
    async fn refused_recipient_resets_transaction() {
        let mock = Builder::new()
            .read(b"220 mx.example.com ESMTP\r\n")
            .write(b"EHLO fairmail.local\r\n")
            .read(b"250 mx.example.com\r\n")
            .write(b"MAIL FROM:<sales@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<a@example.org>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<gone@example.org>\r\n")
            .read(b"550 5.1.1 No such user\r\n")
            .write(b"RSET\r\n")
            .read(b"250 Flushed\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();

        let mut client = Client::greet(mock).await.unwrap();
        client.ehlo("fairmail.local").await.unwrap();
        let mut client = client.without_auth();

        let err = client
            .send_mail(&envelope(&["a@example.org", "gone@example.org"]), b"x\r\n")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Rejected { code: 550, .. }));
        client.quit().await.unwrap();
    }

    #[tokio::test]
    async fn oversized_message_is_refused_before_mail_from() {
        let mock = Builder::new()
            .read(b"220 mx.example.com ESMTP\r\n")
            .write(b"EHLO fairmail.local\r\n")
            .read(b"250-mx.example.com\r\n250 SIZE 4\r\n")
            .build();

        let mut client = Client::greet(mock).await.unwrap();
        client.ehlo("fairmail.local").await.unwrap();
        let mut client = client.without_auth();

        let err = client
            .send_mail(&envelope(&["a@example.org"]), b"too large")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge { size: 9, limit: 4 }));
    }

    #[tokio::test]
    async fn starttls_requires_advertisement() {
        let mock = Builder::new()
            .read(b"220 mx.example.com ESMTP\r\n")
            .write(b"EHLO fairmail.local\r\n")
            .read(b"250 mx.example.com\r\n")
            .build();

        let mut client = Client::greet(mock).await.unwrap();
        client.ehlo("fairmail.local").await.unwrap();
        assert!(matches!(
            client.starttls().await,
            Err(Error::NotSupported(_))
        ));
    }

    #[tokio::test]
    async fn bad_greeting_is_an_error() {
        let mock = Builder::new()
            .read(b"554 No SMTP service here\r\n")
            .build();

        let err = Client::greet(mock).await.unwrap_err();
        assert!(matches!(err, Error::Rejected { code: 554, .. }));
    }
}
