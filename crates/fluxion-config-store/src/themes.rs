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

//! Dashboard colour themes loaded from a directory
//!
//! Supported files:
//! - `*.json` and `*.toml` with `palette` (16 colours), optional `foreground`/`background`
//! - anything else as `key = value` lines, where `palette = N=#rrggbb` sets one
//!   swatch and `palette = #rrggbb` fills the next free one

use crate::error::{Result, StoreServerError};
use fluxion_settings_types::ThemeInfo;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

pub const PALETTE_SIZE: usize = 16;

fn invalid(name: &str, reason: impl Into<String>) -> StoreServerError {
    StoreServerError::Theme {
        name: name.to_owned(),
        reason: reason.into(),
    }
}

/// Load every valid theme in `dir`, keyed by file stem. Invalid files are skipped.
pub fn load_themes(dir: &Path) -> BTreeMap<String, ThemeInfo> {
    let mut themes = BTreeMap::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        debug!("No theme directory at {}", dir.display());
        return themes;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match load_theme_file(&path) {
            Ok(theme) => {
                themes.insert(theme.name.clone(), theme);
            }
            Err(e) => warn!("⚠️ Skipping theme {}: {}", path.display(), e),
        }
    }

    debug!("🎨 Loaded {} theme(s) from {}", themes.len(), dir.display());
    themes
}

pub fn load_theme_file(path: &Path) -> Result<ThemeInfo> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_owned();
    let text = std::fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let raw = match extension.as_deref() {
        Some("json") => serde_json::from_str::<Value>(&text)
            .map_err(|e| invalid(&name, format!("failed to parse: {e}")))?,
        Some("toml") => {
            let table: toml::Table = toml::from_str(&text)
                .map_err(|e| invalid(&name, format!("failed to parse: {e}")))?;
            serde_json::to_value(table)?
        }
        _ => parse_key_value(&name, &text)?,
    };
    normalise(&name, &raw)
}

fn parse_key_value(name: &str, text: &str) -> Result<Value> {
    let mut palette: Vec<Option<String>> = vec![None; PALETTE_SIZE];
    let mut data = serde_json::Map::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=').or_else(|| line.split_once(':')) else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        if !key.eq_ignore_ascii_case("palette") {
            data.insert(
                key.to_ascii_lowercase().replace('-', "_"),
                Value::String(value.to_owned()),
            );
            continue;
        }

        let (index, colour) = match value.split_once('=') {
            Some((index, colour)) => {
                let index: usize = index
                    .trim()
                    .parse()
                    .map_err(|_| invalid(name, format!("bad palette index '{}'", index.trim())))?;
                (index, colour.trim())
            }
            None => {
                let next = palette
                    .iter()
                    .position(Option::is_none)
                    .ok_or_else(|| invalid(name, "too many palette entries"))?;
                (next, value)
            }
        };
        let slot = palette
            .get_mut(index)
            .ok_or_else(|| invalid(name, format!("palette index {index} out of range 0-15")))?;
        *slot = Some(colour.to_owned());
    }

    let palette = palette
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| invalid(name, "palette must define 16 colours (indices 0-15)"))?;
    data.insert(
        "palette".to_owned(),
        Value::Array(palette.into_iter().map(Value::String).collect()),
    );
    Ok(Value::Object(data))
}

fn clean_colour(name: &str, value: &Value, key: &str) -> Result<String> {
    let colour = value
        .as_str()
        .ok_or_else(|| invalid(name, format!("{key} must be a string")))?
        .trim();
    if !colour.starts_with('#') {
        return Err(invalid(
            name,
            format!("{key} must be a hex colour starting with #"),
        ));
    }
    Ok(colour.to_owned())
}

fn normalise(name: &str, raw: &Value) -> Result<ThemeInfo> {
    let object = raw
        .as_object()
        .ok_or_else(|| invalid(name, "theme data must be a mapping"))?;
    let palette = object
        .get("palette")
        .and_then(Value::as_array)
        .filter(|p| p.len() == PALETTE_SIZE)
        .ok_or_else(|| invalid(name, "palette must contain exactly 16 colours"))?;

    let palette = palette
        .iter()
        .enumerate()
        .map(|(i, colour)| clean_colour(name, colour, &format!("palette[{i}]")))
        .collect::<Result<Vec<_>>>()?;
    let white = Value::String("#ffffff".to_owned());
    let black = Value::String("#000000".to_owned());

    Ok(ThemeInfo {
        name: name.to_owned(),
        foreground: clean_colour(name, object.get("foreground").unwrap_or(&white), "foreground")?,
        background: clean_colour(name, object.get("background").unwrap_or(&black), "background")?,
        palette,
    })
}
