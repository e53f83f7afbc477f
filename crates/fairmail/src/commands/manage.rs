//! `fairmail config`, `fairmail password` and `fairmail operator`.

use super::AppContext;
use crate::access::hash_password;
use crate::cli::{ConfigAction, OperatorAction, PasswordAction};
use anyhow::{Result, bail};
use fairmail_core::credentials::{delete_smtp_password, store_smtp_password};
use fairmail_core::{AppConfig, Operator};
use std::process::ExitCode;
use tracing::info;

pub async fn config(ctx: &AppContext, action: ConfigAction) -> Result<ExitCode> {
    match action {
        ConfigAction::Init { email, force } => {
            if ctx.config_path.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite it",
                    ctx.config_path.display()
                );
            }
            AppConfig::for_sender(email.trim()).save(&ctx.config_path).await?;
            println!("Wrote {}", ctx.config_path.display());
            println!("Store the SMTP password with `fairmail password set`.");
        }
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&ctx.config)?);
        }
        ConfigAction::Path => {
            println!("{}", ctx.config_path.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn password(ctx: &AppContext, action: &PasswordAction) -> Result<ExitCode> {
    let account = ctx.keyring_account();
    if account.is_empty() {
        bail!("No sender account configured; run `fairmail config init` first");
    }

    match action {
        PasswordAction::Set => {
            let password = rpassword::prompt_password(format!("SMTP password for {account}: "))?;
            if password.is_empty() {
                bail!("Password is empty");
            }
            store_smtp_password(account, &password)?;
            println!("Password stored for {account}");
        }
        PasswordAction::Clear => {
            delete_smtp_password(account)?;
            println!("Password removed for {account}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn operator(mut ctx: AppContext, action: OperatorAction) -> Result<ExitCode> {
    match action {
        OperatorAction::Add { username } => {
            let password = rpassword::prompt_password(format!("Password for {username}: "))?;
            let confirm = rpassword::prompt_password("Repeat password: ")?;
            if password != confirm {
                bail!("Passwords do not match");
            }
            if password.is_empty() {
                bail!("Password is empty");
            }
            upsert_operator(&mut ctx.config.operators, &username, &password)?;
            ctx.config.save(&ctx.config_path).await?;
            info!("Operator {username} saved");
            println!("Operator {username} saved");
        }
        OperatorAction::Remove { username } => {
            if !remove_operator(&mut ctx.config.operators, &username) {
                bail!("No operator named {username}");
            }
            ctx.config.save(&ctx.config_path).await?;
            println!("Operator {username} removed");
        }
        OperatorAction::List => {
            if ctx.config.operators.is_empty() {
                println!("No operators configured; sending needs no login.");
            }
            for op in &ctx.config.operators {
                println!("{}", op.username);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Adds an operator or replaces the password of an existing one.
fn upsert_operator(operators: &mut Vec<Operator>, username: &str, password: &str) -> Result<()> {
    let password_hash = hash_password(password)?;
    if let Some(existing) = operators.iter_mut().find(|op| op.username == username) {
        existing.password_hash = password_hash;
    } else {
        operators.push(Operator {
            username: username.to_string(),
            password_hash,
        });
    }
    Ok(())
}

fn remove_operator(operators: &mut Vec<Operator>, username: &str) -> bool {
    let before = operators.len();
    operators.retain(|op| op.username != username);
    operators.len() != before
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
    use crate::access::verify;

    #[test]
    fn test_upsert_adds_then_replaces() {
        let mut operators = Vec::new();
        upsert_operator(&mut operators, "ayse", "first").unwrap();
        upsert_operator(&mut operators, "ayse", "second").unwrap();

        assert_eq!(operators.len(), 1);
        assert!(operators[0].password_hash.starts_with("$argon2id$"));
        assert!(verify(&operators, "ayse", "second"));
        assert!(!verify(&operators, "ayse", "first"));
    }

    #[test]
    fn test_remove_operator() {
        let mut operators = Vec::new();
        upsert_operator(&mut operators, "ayse", "pw").unwrap();
        upsert_operator(&mut operators, "mehmet", "pw").unwrap();

        assert!(remove_operator(&mut operators, "ayse"));
        assert!(!remove_operator(&mut operators, "ayse"));
        assert_eq!(operators.len(), 1);
        assert_eq!(operators[0].username, "mehmet");
    }

    #[tokio::test]
    async fn test_config_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let ctx = AppContext {
            config_path: path.clone(),
            config: AppConfig::default(),
            workbook: None,
        };

        let init = |force| ConfigAction::Init {
            email: "export@gmail.com".into(),
            force,
        };
        config(&ctx, init(false)).await.unwrap();
        assert!(config(&ctx, init(false)).await.is_err());
        config(&ctx, init(true)).await.unwrap();

        let saved = AppConfig::load(&path).await.unwrap();
        assert_eq!(saved.account.smtp.host, "smtp.gmail.com");
        assert_eq!(saved.delivery.archive_bcc, ["export@gmail.com"]);
    }
}
