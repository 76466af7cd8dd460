#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! `json-dap`: run data-access operations against a JSON backend.

mod cli;

use std::io::BufRead;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use data_access_sdk::{AccountAttributes, Attributes, SubjectAttributes};
use json_data_access_plugin::JsonDataAccessPlugin;
use secrecy::SecretString;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    let plugin = JsonDataAccessPlugin::load(&cli.config)
        .with_context(|| format!("failed to initialize from {}", cli.config.display()))?;
    info!(
        implementation = JsonDataAccessPlugin::IMPLEMENTATION_TYPE,
        "Data-access plugin ready"
    );

    match cli.command {
        Command::Attributes {
            subject,
            attributes,
        } => {
            let known: Attributes = attributes.into_iter().collect();
            let table = plugin
                .attribute_provider()
                .get_attributes_for(&SubjectAttributes::new(subject, known))
                .await?;
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
        Command::Verify {
            username,
            password_env,
        } => {
            let password = read_password(password_env.as_deref())?
                .context("a password is required for verification")?;
            let result = plugin
                .credential_provider()
                .verify_password(&username, &password)
                .await?;
            let Some(auth) = result else {
                eprintln!("credentials not confirmed for '{username}'");
                return Ok(ExitCode::FAILURE);
            };
            println!("{}", serde_json::to_string_pretty(&auth)?);
        }
        Command::UpdatePassword {
            username,
            password_env,
        } => {
            let mut account = AccountAttributes::new(username);
            if let Some(password) = read_password(password_env.as_deref())? {
                account = account.with_password(password);
            }
            plugin.credential_provider().update_password(&account).await?;
        }
        Command::VerifiesPassword => {
            println!(
                "{}",
                plugin.credential_provider().custom_query_verifies_password()
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Password from the named environment variable, or the first stdin line.
/// An empty value means no password.
fn read_password(env_var: Option<&str>) -> anyhow::Result<Option<SecretString>> {
    let raw = match env_var {
        Some(name) => std::env::var(name).with_context(|| format!("{name} is not set"))?,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_owned()
        }
    };
    Ok((!raw.is_empty()).then(|| SecretString::from(raw)))
}
