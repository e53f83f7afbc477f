//! End-to-end: workbook file -> columns -> recipients -> delivery.

#![allow(clippy::unwrap_used)]

use fairmail_core::{
    BodyFormat, Campaign, CampaignMessage, ColumnSpec, DatasetSource, DeliveryMode,
    DryRunTransport, EmailAddress, MailTransport, TransportError, extract, list_fairs,
    resolve_columns,
};
use fairmail_core::dataset::first_existing;
use fairmail_mime::Mailbox;
use fairmail_smtp::Envelope;

const CONTACTS: &str = "\
Fuar Adı,Firma,Ülke,Telefon,E-mail
Gulfood 2025,Acme Trading,UAE,+971 4 000,\"info@acme.ae; Sales@Acme.ae\"
Anuga 2025,Beta GmbH,DE,+49 221 000,einkauf@beta.de
Gulfood 2025,Gamma LLC,UAE,+971 4 111,sales@acme.ae
Gulfood 2025,Delta,OM,,not an email
 Gulfood 2025 ,Epsilon,SA,,buyer@epsilon.sa
Sial 2025,Zeta,FR,,
";

/// Fails for one address, accepts everything else.
struct RejectOne(&'static str);

impl MailTransport for RejectOne {
    async fn send(&mut self, envelope: &Envelope, _message: &[u8]) -> Result<(), TransportError> {
        if envelope.recipients().iter().any(|r| r.as_str() == self.0) {
            Err(TransportError::Send(format!("550 {} unknown", self.0)))
        } else {
            Ok(())
        }
    }
}

fn write_workbook() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.csv");
    std::fs::write(&path, CONTACTS).unwrap();
    (dir, path)
}

fn campaign(recipients: fairmail_core::RecipientList, mode: DeliveryMode) -> Campaign {
    Campaign {
        fair: "Gulfood 2025".into(),
        sender: Mailbox::with_name("Export Desk", "export@example.com"),
        recipients,
        mode,
        message: CampaignMessage::new(
            "Follow-up – thank you for visiting our booth",
            "Dear Partner,<br><br>Thank you for visiting our booth.",
            BodyFormat::Html,
        ),
        attachments: vec![fairmail_core::Attachment::new(
            "catalogue.pdf",
            b"%PDF-1.7".to_vec(),
        )],
        archive_bcc: vec![EmailAddress::parse("export@example.com").unwrap()],
    }
}

#[test]
fn workbook_to_recipient_list() {
    let (dir, path) = write_workbook();
    let workbook = first_existing(&[dir.path().join("missing.xlsx"), path]).unwrap();
    let dataset = workbook.load("FuarMusteri").unwrap();
    let columns = resolve_columns(&dataset, &ColumnSpec::default()).unwrap();

    assert_eq!(
        list_fairs(&dataset, columns),
        ["Anuga 2025", "Gulfood 2025"]
    );

    let recipients = extract(&dataset, columns, "Gulfood 2025");
    let addresses: Vec<&str> = recipients.iter().map(EmailAddress::as_str).collect();
    assert_eq!(
        addresses,
        ["info@acme.ae", "Sales@Acme.ae", "buyer@epsilon.sa"]
    );
}

#[tokio::test]
async fn individual_campaign_over_dry_run() {
    let (_dir, path) = write_workbook();
    let dataset = fairmail_core::WorkbookFile::new(path).load("FuarMusteri").unwrap();
    let columns = resolve_columns(&dataset, &ColumnSpec::default()).unwrap();
    let campaign = campaign(extract(&dataset, columns, "Gulfood 2025"), DeliveryMode::Individual);

    let mut transport = DryRunTransport::new();
    let outcome = campaign.deliver(&mut transport).await.unwrap();

    assert_eq!((outcome.attempted, outcome.succeeded, outcome.failed), (3, 3, 0));
    let records = transport.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].recipients, ["info@acme.ae", "export@example.com"]);
    assert!(records.iter().all(|r| r.from == "export@example.com"));
}

#[tokio::test]
async fn individual_failure_is_isolated() {
    let (_dir, path) = write_workbook();
    let dataset = fairmail_core::WorkbookFile::new(path).load("FuarMusteri").unwrap();
    let columns = resolve_columns(&dataset, &ColumnSpec::default()).unwrap();
    let campaign = campaign(extract(&dataset, columns, "Gulfood 2025"), DeliveryMode::Individual);

    let outcome = campaign
        .deliver(&mut RejectOne("Sales@Acme.ae"))
        .await
        .unwrap();

    assert_eq!((outcome.attempted, outcome.succeeded, outcome.failed), (3, 2, 1));
    assert_eq!(outcome.failures[0].address.as_str(), "Sales@Acme.ae");
}

#[tokio::test]
async fn bcc_campaign_fails_as_a_unit() {
    let (_dir, path) = write_workbook();
    let dataset = fairmail_core::WorkbookFile::new(path).load("FuarMusteri").unwrap();
    let columns = resolve_columns(&dataset, &ColumnSpec::default()).unwrap();
    let campaign = campaign(extract(&dataset, columns, "Gulfood 2025"), DeliveryMode::SingleBcc);

    let outcome = campaign
        .deliver(&mut RejectOne("buyer@epsilon.sa"))
        .await
        .unwrap();

    assert_eq!((outcome.attempted, outcome.succeeded, outcome.failed), (1, 0, 1));
    assert!(outcome.failures.is_empty());
    assert!(outcome.batch_error.is_some());
}

#[tokio::test]
async fn unknown_fair_is_refused_before_sending() {
    let (_dir, path) = write_workbook();
    let dataset = fairmail_core::WorkbookFile::new(path).load("FuarMusteri").unwrap();
    let columns = resolve_columns(&dataset, &ColumnSpec::default()).unwrap();
    let campaign = campaign(extract(&dataset, columns, "Sial 2025"), DeliveryMode::Individual);

    let mut transport = DryRunTransport::new();
    let err = campaign.deliver(&mut transport).await.unwrap_err();

    assert_eq!(err.to_string(), "No recipients found for the selected fair.");
    assert!(transport.records().is_empty());
}
