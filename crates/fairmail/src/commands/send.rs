//! `fairmail send`.

use super::AppContext;
use crate::access::{prompt, require_operator};
use crate::cli::SendArgs;
use anyhow::{Context, Result, bail};
use fairmail_core::credentials::resolve_smtp_password;
use fairmail_core::{
    Attachment, BodyFormat, Campaign, CampaignMessage, DeliveryMode, DeliveryOutcome,
    DryRunTransport, EmailAddress, Logo, MailTransport, RecipientList, SmtpTransport,
    validate_account,
};
use std::process::ExitCode;
use tracing::warn;

const DELIVERABILITY_TIP: &str = "Tip: To improve deliverability, avoid very large attachments \
                                  and consider sending in batches if the list is big.";

pub async fn run(ctx: &AppContext, args: SendArgs) -> Result<ExitCode> {
    require_operator(&ctx.config.operators, args.operator.as_deref())?;

    let dataset = ctx.load_dataset()?;
    let recipients = ctx.recipients(&dataset, &args.fair);
    let campaign = build_campaign(ctx, &args, recipients)?;
    campaign.validate()?;

    println!(
        "Recipients for '{}': {} ({})",
        campaign.fair,
        campaign.recipients.len(),
        match campaign.mode {
            DeliveryMode::Individual => "one message each",
            DeliveryMode::SingleBcc => "single BCC message",
        }
    );

    if args.dry_run {
        let mut transport = DryRunTransport::new();
        let outcome = deliver(&campaign, &mut transport).await?;
        for record in transport.records() {
            println!(
                "  would send {} bytes to {}",
                record.size,
                record.recipients.join(", ")
            );
        }
        return Ok(report(&outcome));
    }

    if !args.yes {
        let answer = prompt(&format!(
            "Send to {} recipients? [y/N] ",
            campaign.recipients.len()
        ))?;
        if !answer.eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let account = &ctx.config.account;
    if let Err(issues) = validate_account(account) {
        for issue in &issues {
            eprintln!("  {issue}");
        }
        bail!("Sender account is not configured; see `fairmail config show`");
    }
    let password = resolve_smtp_password(ctx.keyring_account())?;
    let mut transport = SmtpTransport::new(account.smtp.clone(), password);

    let outcome = deliver(&campaign, &mut transport).await?;
    Ok(report(&outcome))
}

async fn deliver<T: MailTransport>(
    campaign: &Campaign,
    transport: &mut T,
) -> Result<DeliveryOutcome> {
    Ok(campaign.deliver(transport).await?)
}

fn build_campaign(
    ctx: &AppContext,
    args: &SendArgs,
    recipients: RecipientList,
) -> Result<Campaign> {
    let config = &ctx.config;

    let body = match (&args.body, &args.body_file) {
        (Some(body), _) => body.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Couldn't read body from {}", path.display()))?,
        (None, None) => String::new(),
    };
    let format: BodyFormat = args.format.map_or(config.delivery.format, Into::into);

    let mut message = CampaignMessage::new(&args.subject, body, format);
    if !args.no_signature {
        message = message.with_signature(config.signature.clone());
        if let Some(path) = &config.signature.logo_path {
            match Logo::from_path(path) {
                Ok(logo) => message = message.with_logo(logo),
                Err(e) => warn!("Logo {} not embedded: {e}", path.display()),
            }
        }
    }

    let attachments = args
        .attachments
        .iter()
        .map(|path| {
            Attachment::from_path(path)
                .with_context(|| format!("Couldn't read attachment {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let archive_bcc = match &args.bcc {
        Some(list) => list
            .iter()
            .map(|raw| {
                EmailAddress::parse(raw).with_context(|| format!("Invalid BCC address '{raw}'"))
            })
            .collect::<Result<Vec<_>>>()?,
        None => config.delivery.archive_addresses(),
    };

    Ok(Campaign {
        fair: args.fair.trim().to_string(),
        sender: config.account.mailbox(),
        recipients,
        mode: args.mode.map_or(config.delivery.mode, Into::into),
        message,
        attachments,
        archive_bcc,
    })
}

/// Prints the summary and picks the exit code.
fn report(outcome: &DeliveryOutcome) -> ExitCode {
    for failure in &outcome.failures {
        println!("  FAILED {}: {}", failure.address, failure.error);
    }
    if let Some(error) = &outcome.batch_error {
        println!("  FAILED batch of {}: {error}", outcome.recipients);
    }

    println!("Done. Sent: {} | Failed: {}", outcome.succeeded, outcome.failed);
    if outcome.succeeded > 0 {
        println!("{DELIVERABILITY_TIP}");
    }

    if outcome.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
