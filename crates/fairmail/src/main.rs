//! `fairmail` - trade-fair follow-up mailer
//!
//! Reads the contact workbook, picks the recipients of one fair and sends
//! them a campaign over SMTP.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod access;
mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "fairmail=info,fairmail_core=info",
        1 => "fairmail=debug,fairmail_core=debug,fairmail_smtp=debug",
        _ => "fairmail=trace,fairmail_core=trace,fairmail_smtp=trace,fairmail_mime=trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("Starting fairmail {}", env!("CARGO_PKG_VERSION"));

    match commands::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
