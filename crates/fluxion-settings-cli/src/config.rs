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
use std::time::Duration;
use tracing::debug;

pub const ENV_URL: &str = "FLUXION_SETTINGS_URL";
pub const ENV_TOKEN: &str = "FLUXION_SETTINGS_TOKEN";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_owned()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CliConfig {
    /// Read `path` if it exists, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content).with_context(|| "Failed to parse config TOML")?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_overrides(std::env::var(ENV_URL).ok(), std::env::var(ENV_TOKEN).ok());
        config.validate()?;
        Ok(config)
    }

    /// Empty values are ignored
    pub fn apply_overrides(&mut self, base_url: Option<String>, token: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.store.base_url = url;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.store.token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.store.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("store.base_url must start with http:// or https://, got '{url}'");
        }
        if self.store.timeout_secs == 0 {
            bail!("store.timeout_secs must be greater than 0");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.store.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CliConfig::load(&dir.path().join("fluxion-settings.toml")).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(10));

        let mut config = CliConfig::default();
        config.apply_overrides(None, None);
        assert_eq!(config.store.base_url, "http://localhost:5000");
        assert!(config.store.token.is_none());
    }

    #[test]
    fn test_parse_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fluxion-settings.toml");
        std::fs::write(
            &path,
            "[store]\nbase_url = \"https://energy.local\"\ntoken = \"abc\"\ntimeout_secs = 3\n",
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let config: CliConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.store.base_url, "https://energy.local");
        assert_eq!(config.store.token.as_deref(), Some("abc"));
        assert_eq!(config.store.timeout_secs, 3);
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut config: CliConfig =
            toml::from_str("[store]\nbase_url = \"http://a:5000\"\ntoken = \"file\"\n").unwrap();
        config.apply_overrides(Some("http://b:5000".to_owned()), Some(String::new()));
        assert_eq!(config.store.base_url, "http://b:5000");
        assert_eq!(config.store.token.as_deref(), Some("file"));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = CliConfig::default();
        config.store.base_url = "localhost:5000".to_owned();
        assert!(config.validate().is_err());

        config.store.base_url = "http://localhost:5000".to_owned();
        config.store.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
