//! Campaign delivery.
//!
//! A [`Campaign`] goes out either as one message per recipient
//! ([`DeliveryMode::Individual`]) or as a single message addressed to the
//! sender with every recipient blind-copied ([`DeliveryMode::SingleBcc`]).
//! Sends are strictly sequential. In individual mode a failed send is
//! recorded and the loop moves on; nothing is retried.

use crate::address::EmailAddress;
use crate::message::{Attachment, CampaignMessage};
use crate::recipients::RecipientList;
use crate::transport::MailTransport;
use fairmail_mime::Mailbox;
use fairmail_smtp::{Address, Envelope};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// How a campaign reaches its recipients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// One message per recipient, each showing only that recipient.
    #[default]
    Individual,
    /// One message to the sender, all recipients in the envelope only.
    SingleBcc,
}

/// Reasons a campaign is refused before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No fair was chosen.
    #[error("No fair selected.")]
    NoFairSelected,

    /// The selected fair has no usable addresses.
    #[error("No recipients found for the selected fair.")]
    NoRecipients,

    /// Subject is empty after trimming.
    #[error("Subject cannot be empty.")]
    EmptySubject,

    /// Body is empty after trimming.
    #[error("Message cannot be empty.")]
    EmptyBody,

    /// The sender address cannot be used in an SMTP envelope.
    #[error("Invalid sender address: {0}")]
    InvalidSender(String),
}

/// One recipient that could not be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// Recipient address.
    pub address: EmailAddress,
    /// What went wrong, as reported by the transport.
    pub error: String,
}

/// Counts for a finished campaign.
///
/// In [`DeliveryMode::SingleBcc`] the whole batch is one unit: `attempted`
/// is 1 and either `succeeded` or `failed` is 1. The failure text is in
/// `batch_error` and `failures` stays empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Mode the campaign ran in.
    pub mode: DeliveryMode,
    /// Number of addressed recipients.
    pub recipients: usize,
    /// Send units attempted.
    pub attempted: usize,
    /// Send units accepted by the server.
    pub succeeded: usize,
    /// Send units that failed.
    pub failed: usize,
    /// Per-recipient failures, in send order (individual mode).
    pub failures: Vec<DeliveryFailure>,
    /// Why the batch failed (BCC mode).
    pub batch_error: Option<String>,
}

impl DeliveryOutcome {
    fn new(mode: DeliveryMode, recipients: usize) -> Self {
        Self {
            mode,
            recipients,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
            batch_error: None,
        }
    }

    /// Returns true if every send unit succeeded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Everything needed to run one campaign.
#[derive(Debug, Clone)]
pub struct Campaign {
    /// Fair the recipients were selected for.
    pub fair: String,
    /// From header and envelope sender.
    pub sender: Mailbox,
    /// Recipients in send order.
    pub recipients: RecipientList,
    /// Individual or BCC delivery.
    pub mode: DeliveryMode,
    /// Subject, body and signature.
    pub message: CampaignMessage,
    /// Files attached to every message.
    pub attachments: Vec<Attachment>,
    /// Addresses blind-copied on every message for the sender's records.
    pub archive_bcc: Vec<EmailAddress>,
}

impl Campaign {
    /// Checks the preconditions for sending.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fair.trim().is_empty() {
            return Err(ValidationError::NoFairSelected);
        }
        if self.recipients.is_empty() {
            return Err(ValidationError::NoRecipients);
        }
        if self.message.subject.trim().is_empty() {
            return Err(ValidationError::EmptySubject);
        }
        if self.message.body.trim().is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        self.sender_address()?;
        Ok(())
    }

    fn sender_address(&self) -> Result<Address, ValidationError> {
        Address::new(&self.sender.address)
            .map_err(|_| ValidationError::InvalidSender(self.sender.address.clone()))
    }

    /// Validates and sends the campaign.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] without contacting the transport if a
    /// precondition fails. Transport failures are reported in the outcome.
    pub async fn deliver<T: MailTransport>(
        &self,
        transport: &mut T,
    ) -> Result<DeliveryOutcome, ValidationError> {
        self.validate()?;
        let from = self.sender_address()?;
        info!(
            "Sending '{}' to {} recipients of '{}' ({:?})",
            self.message.subject.trim(),
            self.recipients.len(),
            self.fair,
            self.mode
        );

        let outcome = match self.mode {
            DeliveryMode::Individual => self.deliver_individually(transport, &from).await,
            DeliveryMode::SingleBcc => self.deliver_as_bcc(transport, &from).await,
        };

        info!(
            "Campaign finished: {} sent, {} failed",
            outcome.succeeded, outcome.failed
        );
        Ok(outcome)
    }

    async fn deliver_individually<T: MailTransport>(
        &self,
        transport: &mut T,
        from: &Address,
    ) -> DeliveryOutcome {
        let mut outcome = DeliveryOutcome::new(DeliveryMode::Individual, self.recipients.len());

        for recipient in &self.recipients {
            outcome.attempted += 1;
            match self.send_one(transport, from, recipient).await {
                Ok(()) => {
                    debug!("Sent to {recipient}");
                    outcome.succeeded += 1;
                }
                Err(error) => {
                    warn!("Failed to send to {recipient}: {error}");
                    outcome.failed += 1;
                    outcome.failures.push(DeliveryFailure {
                        address: recipient.clone(),
                        error,
                    });
                }
            }
        }

        outcome
    }

    async fn send_one<T: MailTransport>(
        &self,
        transport: &mut T,
        from: &Address,
        recipient: &EmailAddress,
    ) -> Result<(), String> {
        let message = self
            .message
            .compose(&self.sender, recipient.as_str(), &self.attachments)
            .map_err(|e| e.to_string())?;
        let envelope = build_envelope(
            from,
            std::iter::once(recipient.as_str())
                .chain(self.archive_bcc.iter().map(EmailAddress::as_str)),
        )?;
        transport
            .send(&envelope, &message.to_bytes())
            .await
            .map_err(|e| e.to_string())
    }

    async fn deliver_as_bcc<T: MailTransport>(
        &self,
        transport: &mut T,
        from: &Address,
    ) -> DeliveryOutcome {
        let mut outcome = DeliveryOutcome::new(DeliveryMode::SingleBcc, self.recipients.len());
        outcome.attempted = 1;

        match self.send_batch(transport, from).await {
            Ok(()) => outcome.succeeded = 1,
            Err(error) => {
                warn!("BCC batch failed: {error}");
                outcome.failed = 1;
                outcome.batch_error = Some(error);
            }
        }

        outcome
    }

    async fn send_batch<T: MailTransport>(
        &self,
        transport: &mut T,
        from: &Address,
    ) -> Result<(), String> {
        let message = self
            .message
            .compose(&self.sender, &self.sender.address, &self.attachments)
            .map_err(|e| e.to_string())?;
        let envelope = build_envelope(
            from,
            std::iter::once(self.sender.address.as_str())
                .chain(self.recipients.iter().map(EmailAddress::as_str))
                .chain(self.archive_bcc.iter().map(EmailAddress::as_str)),
        )?;
        debug!("BCC envelope has {} recipients", envelope.recipients().len());
        transport
            .send(&envelope, &message.to_bytes())
            .await
            .map_err(|e| e.to_string())
    }
}

/// Builds an envelope, dropping repeats that differ only in ASCII case.
fn build_envelope<'a>(
    from: &Address,
    recipients: impl IntoIterator<Item = &'a str>,
) -> Result<Envelope, String> {
    let mut seen = HashSet::new();
    let mut to = Vec::new();
    for recipient in recipients {
        if seen.insert(recipient.to_ascii_lowercase()) {
            to.push(Address::new(recipient).map_err(|e| e.to_string())?);
        }
    }
    Envelope::new(from.clone(), to).map_err(|e| e.to_string())
}

/// Runs `campaign` over `transport`. See [`Campaign::deliver`].
///
/// # Errors
///
/// Returns a [`ValidationError`] if the campaign is refused before sending.
pub async fn deliver<T: MailTransport>(
    transport: &mut T,
    campaign: &Campaign,
) -> Result<DeliveryOutcome, ValidationError> {
    campaign.deliver(transport).await
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
    use crate::message::BodyFormat;
    use crate::transport::TransportError;

    /// Records every envelope; fails the sends whose 1-based index is listed.
    #[derive(Default)]
    struct ScriptedTransport {
        fail_on: Vec<usize>,
        sent: Vec<(Vec<String>, String)>,
    }

    impl ScriptedTransport {
        fn failing_on(fail_on: &[usize]) -> Self {
            Self {
                fail_on: fail_on.to_vec(),
                sent: Vec::new(),
            }
        }
    }

    impl MailTransport for ScriptedTransport {
        async fn send(
            &mut self,
            envelope: &Envelope,
            message: &[u8],
        ) -> Result<(), TransportError> {
            self.sent.push((
                envelope.recipients().iter().map(ToString::to_string).collect(),
                String::from_utf8_lossy(message).into_owned(),
            ));
            if self.fail_on.contains(&self.sent.len()) {
                Err(TransportError::Send("550 mailbox unavailable".into()))
            } else {
                Ok(())
            }
        }
    }

    fn recipients(addresses: &[&str]) -> RecipientList {
        addresses
            .iter()
            .map(|a| EmailAddress::parse(a).unwrap())
            .collect()
    }

    fn campaign(mode: DeliveryMode, to: &[&str]) -> Campaign {
        Campaign {
            fair: "Gulfood".into(),
            sender: Mailbox::with_name("Export Desk", "export@example.com"),
            recipients: recipients(to),
            mode,
            message: CampaignMessage::new(
                "Thank you for visiting our booth",
                "Dear Partner,",
                BodyFormat::Html,
            ),
            attachments: Vec::new(),
            archive_bcc: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_individual_failure_does_not_abort() {
        let campaign = campaign(
            DeliveryMode::Individual,
            &["a@x.com", "b@x.com", "c@x.com"],
        );
        let mut transport = ScriptedTransport::failing_on(&[2]);

        let outcome = campaign.deliver(&mut transport).await.unwrap();

        assert_eq!(outcome.attempted, 3);
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].address.as_str(), "b@x.com");
        assert!(outcome.failures[0].error.contains("550"));
        assert_eq!(transport.sent.len(), 3);
        assert!(!outcome.is_complete());
    }

    #[tokio::test]
    async fn test_individual_sends_one_visible_recipient_each() {
        let mut campaign = campaign(DeliveryMode::Individual, &["a@x.com", "b@x.com"]);
        campaign.archive_bcc = vec![
            EmailAddress::parse("export@example.com").unwrap(),
            EmailAddress::parse("A@X.com").unwrap(),
        ];
        let mut transport = ScriptedTransport::default();

        campaign.deliver(&mut transport).await.unwrap();

        let (first_envelope, first_message) = &transport.sent[0];
        assert_eq!(first_envelope, &["a@x.com", "export@example.com"]);
        assert!(first_message.contains("To: a@x.com\r\n"));
        assert!(!first_message.contains("b@x.com"));
        assert!(!first_message.contains("Bcc"));

        let (second_envelope, _) = &transport.sent[1];
        assert_eq!(second_envelope, &["b@x.com", "export@example.com", "A@X.com"]);
    }

    #[tokio::test]
    async fn test_bcc_is_one_send_to_sender() {
        let campaign = campaign(DeliveryMode::SingleBcc, &["a@x.com", "b@x.com", "c@x.com"]);
        let mut transport = ScriptedTransport::default();

        let outcome = campaign.deliver(&mut transport).await.unwrap();

        assert_eq!(transport.sent.len(), 1);
        let (envelope, message) = &transport.sent[0];
        assert_eq!(
            envelope,
            &["export@example.com", "a@x.com", "b@x.com", "c@x.com"]
        );
        assert!(message.contains("To: export@example.com\r\n"));
        assert!(!message.contains("a@x.com"));
        assert_eq!(
            (outcome.attempted, outcome.succeeded, outcome.failed),
            (1, 1, 0)
        );
        assert_eq!(outcome.recipients, 3);
    }

    #[tokio::test]
    async fn test_bcc_failure_is_atomic() {
        let campaign = campaign(DeliveryMode::SingleBcc, &["a@x.com", "b@x.com"]);
        let mut transport = ScriptedTransport::failing_on(&[1]);

        let outcome = campaign.deliver(&mut transport).await.unwrap();

        assert_eq!(outcome.succeeded, 0);
        assert_eq!(outcome.failed, 1);
        assert!(outcome.failures.is_empty());
        assert!(outcome.batch_error.unwrap().contains("550"));
    }

    /// Recipients as extracted from a `Name <addr>` style cell.
    fn bracketed_cell() -> RecipientList {
        crate::address::parse_cell("Buyer <b@x.com>, a@x.com")
            .into_iter()
            .collect()
    }

    #[tokio::test]
    async fn test_bracketed_cell_reaches_individual_envelopes() {
        let mut campaign = campaign(DeliveryMode::Individual, &[]);
        campaign.recipients = bracketed_cell();
        let mut transport = ScriptedTransport::default();

        let outcome = campaign.deliver(&mut transport).await.unwrap();

        assert_eq!(
            (outcome.attempted, outcome.succeeded, outcome.failed),
            (2, 2, 0)
        );
        assert_eq!(transport.sent[0].0, ["b@x.com"]);
        assert!(transport.sent[0].1.contains("To: b@x.com\r\n"));
        assert_eq!(transport.sent[1].0, ["a@x.com"]);
    }

    #[tokio::test]
    async fn test_bracketed_cell_reaches_bcc_envelope() {
        let mut campaign = campaign(DeliveryMode::SingleBcc, &[]);
        campaign.recipients = bracketed_cell();
        let mut transport = ScriptedTransport::default();

        let outcome = campaign.deliver(&mut transport).await.unwrap();

        assert!(outcome.is_complete());
        assert!(outcome.batch_error.is_none());
        assert_eq!(
            transport.sent[0].0,
            ["export@example.com", "b@x.com", "a@x.com"]
        );
    }

    #[tokio::test]
    async fn test_validation_prevents_any_send() {
        let mut transport = ScriptedTransport::default();

        let empty = campaign(DeliveryMode::Individual, &[]);
        assert_eq!(
            empty.deliver(&mut transport).await.unwrap_err(),
            ValidationError::NoRecipients
        );

        let mut no_fair = campaign(DeliveryMode::Individual, &["a@x.com"]);
        no_fair.fair = "  ".into();
        assert_eq!(
            no_fair.deliver(&mut transport).await.unwrap_err(),
            ValidationError::NoFairSelected
        );

        let mut blank_subject = campaign(DeliveryMode::SingleBcc, &["a@x.com"]);
        blank_subject.message.subject = " \t".into();
        assert_eq!(
            blank_subject.deliver(&mut transport).await.unwrap_err(),
            ValidationError::EmptySubject
        );

        let mut blank_body = campaign(DeliveryMode::Individual, &["a@x.com"]);
        blank_body.message.body = "\n".into();
        assert_eq!(
            blank_body.deliver(&mut transport).await.unwrap_err(),
            ValidationError::EmptyBody
        );

        let mut bad_sender = campaign(DeliveryMode::Individual, &["a@x.com"]);
        bad_sender.sender = Mailbox::new("not an address");
        assert!(matches!(
            bad_sender.deliver(&mut transport).await,
            Err(ValidationError::InvalidSender(_))
        ));

        assert!(transport.sent.is_empty());
    }

    #[tokio::test]
    async fn test_free_function_matches_method() {
        let campaign = campaign(DeliveryMode::Individual, &["a@x.com"]);
        let mut transport = ScriptedTransport::default();
        let outcome = deliver(&mut transport, &campaign).await.unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.mode, DeliveryMode::Individual);
    }

    #[test]
    fn test_envelope_drops_repeats() {
        let from = Address::new("export@example.com").unwrap();
        let envelope = build_envelope(&from, ["a@x.com", "A@X.COM", "b@x.com"]).unwrap();
        let to: Vec<String> = envelope.recipients().iter().map(ToString::to_string).collect();
        assert_eq!(to, ["a@x.com", "b@x.com"]);
    }
}
