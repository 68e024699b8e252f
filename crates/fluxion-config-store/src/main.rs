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

use anyhow::Context;
use fluxion_config_store::StoreServerConfig;
use std::path::Path;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "fluxion-config-store.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());

    let config = if Path::new(&config_path).exists() {
        info!("📄 Loading store configuration from {}", config_path);
        StoreServerConfig::from_file(&config_path)?
    } else {
        info!("📄 {} not found, using default store configuration", config_path);
        StoreServerConfig::default()
    };

    fluxion_config_store::serve(&config)
        .await
        .context("Configuration store stopped with an error")
}
