//! Command-line definition.

use clap::{Args, Parser, Subcommand, ValueEnum};
use fairmail_core::{BodyFormat, DeliveryMode};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fairmail")]
#[command(about = "Send follow-up emails to the contacts of a trade fair", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Workbook to read instead of the configured candidates
    #[arg(long, global = true, value_name = "PATH")]
    pub workbook: Option<PathBuf>,

    /// Verbosity level (can be repeated)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the fairs found in the workbook
    Fairs,

    /// Show who a campaign for one fair would reach
    Recipients {
        /// Fair name, exactly as in the sheet
        #[arg(long)]
        fair: String,
    },

    /// Send a campaign to the recipients of one fair
    Send(SendArgs),

    /// Create or inspect the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Store or remove the SMTP password in the system keyring
    Password {
        #[command(subcommand)]
        action: PasswordAction,
    },

    /// Manage who may send campaigns
    Operator {
        #[command(subcommand)]
        action: OperatorAction,
    },
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Fair name, exactly as in the sheet
    #[arg(long)]
    pub fair: String,

    /// Subject line
    #[arg(long)]
    pub subject: String,

    /// Message body
    #[arg(long, conflicts_with = "body_file", required_unless_present = "body_file")]
    pub body: Option<String>,

    /// Read the message body from a file
    #[arg(long, value_name = "PATH")]
    pub body_file: Option<PathBuf>,

    /// Body format (defaults to the configured one)
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Attach a file (repeatable)
    #[arg(long = "attach", value_name = "PATH")]
    pub attachments: Vec<PathBuf>,

    /// Delivery mode (defaults to the configured one)
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Archive BCC addresses, comma separated, replacing the configured list
    #[arg(long, value_delimiter = ',', value_name = "ADDRESSES")]
    pub bcc: Option<Vec<String>>,

    /// Leave the signature out
    #[arg(long)]
    pub no_signature: bool,

    /// Compose everything but don't connect to the server
    #[arg(long)]
    pub dry_run: bool,

    /// Operator name for the login check
    #[arg(long)]
    pub operator: Option<String>,

    /// Don't ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// One message per recipient
    Individual,
    /// One message, all recipients blind-copied
    Bcc,
}

impl From<ModeArg> for DeliveryMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Individual => Self::Individual,
            ModeArg::Bcc => Self::SingleBcc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Html,
    Plain,
}

impl From<FormatArg> for BodyFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Html => Self::Html,
            FormatArg::Plain => Self::Plain,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Write a starter config for a sender address
    Init {
        /// Sender email address
        #[arg(long)]
        email: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config
    Show,
    /// Print the config file path
    Path,
}

#[derive(Debug, Subcommand)]
pub enum PasswordAction {
    /// Prompt for the SMTP password and store it
    Set,
    /// Remove the stored SMTP password
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum OperatorAction {
    /// Add an operator or change their password
    Add {
        /// Login name
        username: String,
    },
    /// Remove an operator
    Remove {
        /// Login name
        username: String,
    },
    /// List operator names
    List,
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
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_send_arguments() {
        let cli = Cli::try_parse_from([
            "fairmail",
            "send",
            "--fair",
            "Gulfood 2025",
            "--subject",
            "Thanks",
            "--body",
            "Dear Partner,",
            "--attach",
            "a.pdf",
            "--attach",
            "b.xlsx",
            "--mode",
            "bcc",
            "--bcc",
            "x@example.com,y@example.com",
            "--dry-run",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.fair, "Gulfood 2025");
        assert_eq!(args.attachments, [PathBuf::from("a.pdf"), PathBuf::from("b.xlsx")]);
        assert_eq!(DeliveryMode::from(args.mode.unwrap()), DeliveryMode::SingleBcc);
        assert_eq!(args.bcc.unwrap(), ["x@example.com", "y@example.com"]);
        assert!(args.dry_run);
        assert!(!args.yes);
    }

    #[test]
    fn test_send_needs_a_body() {
        assert!(
            Cli::try_parse_from(["fairmail", "send", "--fair", "X", "--subject", "S"]).is_err()
        );
        assert!(
            Cli::try_parse_from([
                "fairmail", "send", "--fair", "X", "--subject", "S", "--body", "b",
                "--body-file", "b.html",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli =
            Cli::try_parse_from(["fairmail", "fairs", "--workbook", "contacts.xlsx"]).unwrap();
        assert_eq!(cli.workbook, Some(PathBuf::from("contacts.xlsx")));
        assert!(matches!(cli.command, Command::Fairs));
    }
}
