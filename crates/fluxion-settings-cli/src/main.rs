// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! FluxION settings CLI - view and edit configuration held by a configuration store

mod cli;
mod config;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::formatters::{format_issues, format_warnings};
use cli::{Cli, Commands, SetOutcome, TableFormatter, commands};
use config::CliConfig;
use fluxion_settings_client::SettingsClient;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load(&cli.config)?;
    debug!("Using store at {}", config.store.base_url);

    let mut client = SettingsClient::new(config.store.base_url.clone(), config.timeout())
        .context("Failed to create store client")?;
    if let Some(token) = &config.store.token {
        client = client.with_token(token.clone());
    }

    match cli.command {
        Commands::Show { tab } => {
            let views = commands::show(client, tab).await?;
            println!("{}", TableFormatter::format_fields(&views));
        }
        Commands::Set {
            assignments,
            dry_run,
        } => match commands::set(client, &assignments, dry_run).await? {
            SetOutcome::Invalid(errors) => {
                eprint!("{}", format_issues(errors.iter().map(|(k, m)| (k.as_str(), m.as_str()))));
                bail!("Nothing saved: {} field(s) are invalid", errors.len());
            }
            SetOutcome::Unchanged => println!("Nothing to change"),
            SetOutcome::DryRun(patch) => {
                println!("{}", serde_json::to_string_pretty(&patch)?);
            }
            SetOutcome::Saved(warnings) => {
                println!("✅ Saved");
                print!("{}", format_warnings(&warnings));
            }
            SetOutcome::Rejected(errors) => {
                eprint!("{}", format_issues(errors.iter().map(|(k, m)| (k.as_str(), m.as_str()))));
                bail!("Store rejected the configuration");
            }
        },
        Commands::RestoreDefaults => {
            commands::restore_defaults(client).await?;
            println!("🔄 Configuration restored to defaults");
        }
        Commands::Entities { domain } => {
            let entities = client
                .get_entities()
                .await
                .context("Failed to list entities")?
                .into_iter()
                .filter(|e| domain.as_deref().is_none_or(|d| e.domain == d))
                .collect::<Vec<_>>();
            println!("{}", TableFormatter::format_entities(&entities));
        }
        Commands::Themes => {
            let themes = client.get_themes().await.context("Failed to list themes")?;
            println!("{}", TableFormatter::format_themes(&themes));
        }
        Commands::Theme { name, accent } => {
            client
                .apply_theme(&name, accent)
                .await
                .with_context(|| format!("Failed to apply theme '{name}'"))?;
            println!("🎨 Theme set to {name}");
        }
    }

    Ok(())
}
