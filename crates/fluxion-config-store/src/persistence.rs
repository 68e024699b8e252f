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

//! On-disk storage of the configuration document
//!
//! The document is written inside an envelope carrying save metadata. Bare
//! documents (hand-edited or shipped defaults) are accepted on load.

use crate::error::{Result, StoreServerError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub last_modified: DateTime<Utc>,
    pub modified_by: String,
    pub version: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    config: Value,
    metadata: DocumentMetadata,
}

#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    defaults_path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>, defaults_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            defaults_path: defaults_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the live document, seeding it from defaults on first start
    pub fn load_or_seed(&self) -> Result<(Value, Option<DocumentMetadata>)> {
        if !self.path.exists() {
            info!(
                "📄 No stored configuration at {}, seeding from defaults",
                self.path.display()
            );
            let defaults = self.load_defaults()?;
            let metadata = self.save(&defaults, "seed", 0)?;
            return Ok((defaults, Some(metadata)));
        }
        read_document(&self.path)
    }

    pub fn load_defaults(&self) -> Result<Value> {
        if !self.defaults_path.exists() {
            warn!(
                "⚠️ Default configuration not found at {}",
                self.defaults_path.display()
            );
            return Err(StoreServerError::DefaultsMissing(
                self.defaults_path.display().to_string(),
            ));
        }
        read_document(&self.defaults_path).map(|(document, _)| document)
    }

    /// Atomically replace the stored document, returning the new metadata
    pub fn save(&self, document: &Value, modified_by: &str, version: u64) -> Result<DocumentMetadata> {
        if !document.is_object() {
            return Err(StoreServerError::NotAnObject);
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let metadata = DocumentMetadata {
            last_modified: Utc::now(),
            modified_by: modified_by.to_owned(),
            version,
        };
        let envelope = Envelope {
            config: document.clone(),
            metadata: metadata.clone(),
        };

        // Write to temp file first, then rename so readers never see a partial document
        let temp_path = self.path.with_extension("tmp");
        let json = serde_json::to_string_pretty(&envelope)?;
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, &self.path)?;

        debug!(
            "💾 Stored configuration v{} at {}",
            version,
            self.path.display()
        );
        Ok(metadata)
    }
}

fn read_document(path: &Path) -> Result<(Value, Option<DocumentMetadata>)> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;

    let is_envelope = value.get("config").is_some_and(Value::is_object)
        && value.get("metadata").is_some_and(Value::is_object);
    if is_envelope {
        let envelope: Envelope = serde_json::from_value(value)?;
        return Ok((envelope.config, Some(envelope.metadata)));
    }

    if value.is_object() {
        Ok((value, None))
    } else {
        Err(StoreServerError::NotAnObject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn files(dir: &TempDir) -> ConfigFile {
        ConfigFile::new(
            dir.path().join("data").join("config.json"),
            dir.path().join("config.default.json"),
        )
    }

    #[test]
    fn test_seed_from_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.default.json"),
            json!({"battery": {"capacity_kwh": 10}}).to_string(),
        )
        .unwrap();

        let store = files(&dir);
        let (document, metadata) = store.load_or_seed().unwrap();
        assert_eq!(document["battery"]["capacity_kwh"], 10);
        assert_eq!(metadata.unwrap().modified_by, "seed");
        assert!(store.path().exists());
    }

    #[test]
    fn test_seed_without_defaults_fails() {
        let dir = TempDir::new().unwrap();
        let result = files(&dir).load_or_seed();
        assert!(matches!(result, Err(StoreServerError::DefaultsMissing(_))));
    }

    #[test]
    fn test_save_then_load_envelope() {
        let dir = TempDir::new().unwrap();
        let store = files(&dir);
        store.save(&json!({"timezone": "Europe/Prague"}), "api", 3).unwrap();

        let (document, metadata) = read_document(store.path()).unwrap();
        assert_eq!(document, json!({"timezone": "Europe/Prague"}));
        assert_eq!(metadata.unwrap().version, 3);
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn test_bare_document_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bare.json");
        std::fs::write(&path, r#"{"config": 1, "battery": {}}"#).unwrap();

        let (document, metadata) = read_document(&path).unwrap();
        assert_eq!(document["config"], 1);
        assert!(metadata.is_none());
    }

    #[test]
    fn test_non_object_rejected() {
        let dir = TempDir::new().unwrap();
        let store = files(&dir);
        assert!(matches!(
            store.save(&json!([1, 2]), "api", 1),
            Err(StoreServerError::NotAnObject)
        ));
    }
}
