//! Subcommand handlers.

mod manage;
mod send;

use crate::cli::{Cli, Command};
use anyhow::{Context, Result};
use fairmail_core::dataset::first_existing;
use fairmail_core::{
    AppConfig, Dataset, DatasetSource, RecipientList, WorkbookFile, extract, list_fairs,
    resolve_columns,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Options shared by every subcommand.
pub struct AppContext {
    /// Where the config was loaded from (and is saved to).
    pub config_path: PathBuf,
    /// Loaded config, defaults if the file is missing.
    pub config: AppConfig,
    /// Workbook override from the command line.
    pub workbook: Option<PathBuf>,
}

impl AppContext {
    /// Reads the workbook sheet named in the config.
    fn load_dataset(&self) -> Result<Dataset> {
        let source = match &self.workbook {
            Some(path) => WorkbookFile::new(path),
            None => first_existing(&self.config.workbook.paths)?,
        };
        let sheet = &self.config.workbook.sheet;
        source
            .load(sheet)
            .with_context(|| format!("Couldn't read '{sheet}' from {}", source.path().display()))
    }

    /// Keyring entry name for the SMTP password.
    fn keyring_account(&self) -> &str {
        let account = &self.config.account;
        let username = account.smtp.username.trim();
        if username.is_empty() {
            account.email.trim()
        } else {
            username
        }
    }

    /// Recipients of one fair. Unresolvable columns give an empty list.
    fn recipients(&self, dataset: &Dataset, fair: &str) -> RecipientList {
        resolve_columns(dataset, &self.config.columns)
            .map(|columns| extract(dataset, columns, fair))
            .unwrap_or_default()
    }
}

/// Dispatches the parsed command line.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&config_path).await?;
    let ctx = AppContext {
        config_path,
        config,
        workbook: cli.workbook,
    };

    match cli.command {
        Command::Fairs => fairs(&ctx),
        Command::Recipients { fair } => recipients(&ctx, &fair),
        Command::Send(args) => send::run(&ctx, args).await,
        Command::Config { action } => manage::config(&ctx, action).await,
        Command::Password { action } => manage::password(&ctx, &action),
        Command::Operator { action } => manage::operator(ctx, action).await,
    }
}

fn fairs(ctx: &AppContext) -> Result<ExitCode> {
    let dataset = ctx.load_dataset()?;
    let Some(columns) = resolve_columns(&dataset, &ctx.config.columns) else {
        println!("No fair/email columns found in the sheet.");
        return Ok(ExitCode::SUCCESS);
    };

    let fairs = list_fairs(&dataset, columns);
    if fairs.is_empty() {
        println!("No fairs with email addresses found.");
    }
    for fair in fairs {
        let count = extract(&dataset, columns, &fair).len();
        println!("{fair}\t{count} recipients");
    }
    Ok(ExitCode::SUCCESS)
}

fn recipients(ctx: &AppContext, fair: &str) -> Result<ExitCode> {
    let dataset = ctx.load_dataset()?;
    let recipients = ctx.recipients(&dataset, fair);

    println!("Recipients for '{fair}': {}", recipients.len());
    for address in &recipients {
        println!("  {address}");
    }
    Ok(ExitCode::SUCCESS)
}
