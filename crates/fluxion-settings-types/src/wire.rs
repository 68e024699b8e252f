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

//! JSON bodies exchanged with the configuration store

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    Success,
    Error,
}

/// Server-side validation failure for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// Field key (dotted document path)
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Non-blocking advisory returned by a successful save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveWarning {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
}

/// Response of `POST /api/config/save`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub status: SaveStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldIssue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SaveWarning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SaveResponse {
    pub fn success(warnings: Vec<SaveWarning>) -> Self {
        Self {
            status: SaveStatus::Success,
            errors: Vec::new(),
            warnings,
            message: None,
        }
    }

    pub fn rejected(errors: Vec<FieldIssue>) -> Self {
        Self {
            status: SaveStatus::Error,
            errors,
            warnings: Vec::new(),
            message: Some("Configuration validation failed".to_owned()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SaveStatus::Success
    }
}

/// Generic `{status, message?}` acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: SaveStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: SaveStatus::Success,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: SaveStatus::Error,
            message: Some(message.into()),
        }
    }
}

/// Home Assistant entity offered by entity pickers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaEntity {
    pub entity_id: String,
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub domain: String,
}

impl HaEntity {
    /// Domain is the part of the id before the first dot
    pub fn new(entity_id: impl Into<String>, friendly_name: impl Into<String>) -> Self {
        let entity_id = entity_id.into();
        let domain = entity_id
            .split_once('.')
            .map(|(domain, _)| domain.to_owned())
            .unwrap_or_default();
        Self {
            entity_id,
            friendly_name: friendly_name.into(),
            domain,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitiesResponse {
    pub entities: Vec<HaEntity>,
}

/// Dashboard colour theme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeInfo {
    pub name: String,
    #[serde(default)]
    pub foreground: String,
    #[serde(default)]
    pub background: String,
    /// Sixteen hex colours, indexed by accent index
    #[serde(default)]
    pub palette: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemesResponse {
    #[serde(default)]
    pub current: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_index: Option<u8>,
    #[serde(default)]
    pub themes: Vec<ThemeInfo>,
}

/// Body of `POST /api/theme`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeSelectRequest {
    pub theme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_index: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_response_parses_error_body() {
        let body = r#"{
            "status": "error",
            "message": "Configuration validation failed",
            "errors": [{"field": "battery.capacity_kwh", "message": "Must be greater than 0"}]
        }"#;
        let response: SaveResponse = serde_json::from_str(body).unwrap();
        assert!(!response.is_success());
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].field, "battery.capacity_kwh");
        assert!(response.warnings.is_empty());
    }

    #[test]
    fn test_save_response_minimal_success() {
        let response: SaveResponse = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(response.is_success());
        let json = serde_json::to_value(SaveResponse::success(Vec::new())).unwrap();
        assert_eq!(json, serde_json::json!({"status": "success"}));
    }

    #[test]
    fn test_entity_domain() {
        let entity = HaEntity::new("sensor.battery_soc", "Battery SoC");
        assert_eq!(entity.domain, "sensor");
        assert_eq!(HaEntity::new("weird", "").domain, "");
    }
}
