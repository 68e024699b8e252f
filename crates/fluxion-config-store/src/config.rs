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

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub home_assistant: HomeAssistantSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Live document, rewritten on every save
    #[serde(default = "default_config_path")]
    pub config_path: String,
    /// Shipped defaults, copied over the live document on reset
    #[serde(default = "default_defaults_path")]
    pub defaults_path: String,
    /// Directory of `.json`, `.toml` or `key = value` theme files
    #[serde(default)]
    pub themes_dir: Option<String>,
}

/// Entities offered to entity pickers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeAssistantSettings {
    #[serde(default)]
    pub entities: Vec<EntityEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityEntry {
    pub entity_id: String,
    #[serde(default)]
    pub friendly_name: String,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    5000
}

fn default_config_path() -> String {
    "./data/config.json".to_owned()
}

fn default_defaults_path() -> String {
    "./config.default.json".to_owned()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
            defaults_path: default_defaults_path(),
            themes_dir: None,
        }
    }
}

impl StoreServerConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: Self =
            toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.config_path.trim().is_empty() {
            bail!("storage.config_path must be set");
        }
        if self.storage.defaults_path.trim().is_empty() {
            bail!("storage.defaults_path must be set");
        }
        if self.storage.config_path == self.storage.defaults_path {
            bail!("storage.config_path and storage.defaults_path must differ");
        }
        if let Some(entry) = self
            .home_assistant
            .entities
            .iter()
            .find(|e| !e.entity_id.contains('.'))
        {
            bail!(
                "home_assistant.entities: '{}' is not a domain.object_id entity id",
                entry.entity_id
            );
        }
        Ok(())
    }
}
