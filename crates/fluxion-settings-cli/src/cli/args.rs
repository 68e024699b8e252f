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

use clap::{Parser, Subcommand};
use fluxion_settings::catalog::Tab;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fluxion-settings")]
#[command(about = "View and edit FluxION configuration from the terminal")]
#[command(
    long_about = "View and edit the FluxION configuration document held by a configuration store.\n\
    \nEdits are validated locally with the same rules as the dashboard before anything is sent.\n\
    \nExamples:\n  \
    fluxion-settings show --tab parameters\n  \
    fluxion-settings set battery.capacity_kwh=27 battery.min_soc_percent=10\n  \
    fluxion-settings set system.has_water_heater=false --dry-run\n  \
    fluxion-settings theme nord --accent 4"
)]
pub struct Cli {
    /// Path to the CLI config file
    #[arg(long, global = true, default_value = "fluxion-settings.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show fields with their current values
    Show {
        /// Only fields on this tab (system, parameters, ui, advanced)
        #[arg(long)]
        tab: Option<Tab>,
    },

    /// Set one or more fields and save
    #[command(
        long_about = "Set fields using KEY=VALUE pairs, validate, and save the minimal patch.\n\
        \nValues use the same text form as the dashboard: numbers as typed, booleans as\n\
        true/false, arrays as comma-separated tokens. An empty numeric value leaves the\n\
        stored value unchanged.\n\
        \nExamples:\n  \
        fluxion-settings set battery.max_soc_percent=95\n  \
        fluxion-settings set nordpool.resolution_minutes=60 --dry-run"
    )]
    Set {
        /// Assignments in KEY=VALUE form
        #[arg(required = true, value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,

        /// Print the patch without saving
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Replace the stored configuration with shipped defaults
    RestoreDefaults,

    /// List Home Assistant entities known to the store
    Entities {
        /// Only entities of this domain (e.g. sensor, switch)
        #[arg(long)]
        domain: Option<String>,
    },

    /// List available dashboard themes
    Themes,

    /// Select a dashboard theme
    Theme {
        name: String,

        /// Palette index used as the accent colour (0-15)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=15))]
        accent: Option<u8>,
    },
}

pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
