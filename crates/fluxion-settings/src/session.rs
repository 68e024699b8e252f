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

//! Settings session controller
//!
//! Owns the loaded document, the live form and its errors for one schema. Every
//! mutating operation takes `&mut self`, so a session never has two loads or two
//! saves in flight.

use crate::error::{Result, SessionError};
use crate::form::{FormState, build_form_state};
use crate::patch::{build_patch, is_empty_patch};
use crate::path;
use crate::store::ConfigStore;
use crate::validation::{FieldErrors, validate_field, validate_form};
use crate::visibility;
use fluxion_settings_types::{
    ConfigDocument, FieldType, Patch, Schema, SaveWarning, SelectOption,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Nothing loaded yet
    Idle,
    Loading,
    /// Form matches the loaded document
    Ready,
    /// Form has local edits
    Editing,
    Saving,
    Resetting,
}

/// Everything a renderer needs for one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub key: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helper: Option<String>,
    pub field_type: FieldType,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companion_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsection: Option<String>,
}

#[derive(Debug)]
pub struct SettingsSession<S> {
    store: S,
    schema: Arc<Schema>,
    state: SessionState,
    document: Option<ConfigDocument>,
    baseline: FormState,
    form: FormState,
    errors: FieldErrors,
    warnings: Vec<SaveWarning>,
    load_error: Option<String>,
    save_error: Option<String>,
}

impl<S: ConfigStore> SettingsSession<S> {
    pub fn new(store: S, schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            store,
            schema: schema.into(),
            state: SessionState::Idle,
            document: None,
            baseline: FormState::default(),
            form: FormState::default(),
            errors: FieldErrors::default(),
            warnings: Vec::new(),
            load_error: None,
            save_error: None,
        }
    }

    /// Fetch the document and rebuild the form from it
    ///
    /// On failure the previous document and form stay in place and the error is
    /// kept in [`Self::load_error`].
    pub async fn load(&mut self) -> Result<()> {
        let previous = self.state;
        self.state = SessionState::Loading;

        match self.store.fetch_config().await {
            Ok(document) => {
                self.apply_document(document);
                info!(
                    "📥 Loaded configuration from {} store ({} fields)",
                    self.store.name(),
                    self.schema.len()
                );
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load configuration from {}: {}", self.store.name(), e);
                self.load_error = Some(e.to_string());
                self.state = if self.document.is_some() {
                    previous
                } else {
                    SessionState::Idle
                };
                Err(SessionError::Load(e))
            }
        }
    }

    /// Load again, discarding local edits
    pub async fn reload(&mut self) -> Result<()> {
        self.load().await
    }

    fn apply_document(&mut self, document: ConfigDocument) {
        self.form = build_form_state(&document, &self.schema);
        self.baseline = self.form.clone();
        self.errors = self.stored_value_errors(&document);
        if self.errors.has_errors() {
            warn!("Stored configuration has {} invalid field(s)", self.errors.len());
        }
        self.load_error = None;
        self.save_error = None;
        self.document = Some(document);
        self.state = SessionState::Ready;
    }

    /// Errors in values the document actually holds; keys it lacks are not flagged
    fn stored_value_errors(&self, document: &ConfigDocument) -> FieldErrors {
        let all = validate_form(&self.schema, &self.form);
        let mut errors = FieldErrors::default();
        for (key, message) in all.iter() {
            let stored = self
                .schema
                .field(key)
                .is_some_and(|field| path::get(document, &field.path).is_some());
            if stored {
                errors.insert(key, message);
            }
        }
        errors
    }

        /// Record an edit and re-validate everything it can affect
    pub fn handle_change(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        if !self.schema.contains(key) {
            return Err(SessionError::UnknownField(key.to_owned()));
        }
        let value = value.into();
        let schema = Arc::clone(&self.schema);

        self.form.set(key, value.clone());
        let mut update = validate_field(&schema, key, &value, &self.form);
        for dependent in schema.dependents_of(key) {
            update.merge(validate_field(
                &schema,
                &dependent.key,
                self.form.value(&dependent.key),
                &self.form,
            ));
        }
        self.errors.apply(update);

        if self.state == SessionState::Ready {
            self.state = SessionState::Editing;
        }
        Ok(())
    }

    /// Persist the difference between the form and the loaded document
    ///
    /// Returns `Ok(false)` when the save was blocked by local errors, rejected by the
    /// store, or could not start; `Ok(true)` when nothing needed saving or the store
    /// accepted the patch. An accepted save reloads the document. `extra_patch` must
    /// be a JSON object.
    pub async fn save(&mut self, extra_patch: Option<&Patch>) -> Result<bool> {
        if self.state == SessionState::Saving {
            return Ok(false);
        }
        let Some(document) = &self.document else {
            warn!("Save requested before configuration was loaded");
            return Ok(false);
        };
        if self.errors.has_errors() {
            info!("Save blocked by {} field error(s)", self.errors.len());
            return Ok(false);
        }

        let mut patch = build_patch(document, &self.form, &self.schema);
        if let Some(extra) = extra_patch {
            if !extra.is_object() {
                warn!("Extra patch is not an object: {}", extra);
                self.save_error = Some("Extra patch must be a JSON object".to_owned());
                return Ok(false);
            }
            path::merge(&mut patch, extra.clone());
        }
        if is_empty_patch(&patch) {
            debug!("Nothing to save");
            return Ok(true);
        }

        let previous = self.state;
        self.state = SessionState::Saving;
        self.warnings.clear();
        self.save_error = None;

        let response = match self.store.save_config(&patch).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to save configuration: {}", e);
                self.state = previous;
                self.save_error = Some(e.to_string());
                return Err(SessionError::SaveTransport(e));
            }
        };

        if !response.is_success() {
            warn!("Store rejected configuration with {} issue(s)", response.errors.len());
            self.errors.extend_issues(&response.errors);
            if response.errors.is_empty() {
                self.save_error = response
                    .message
                    .or_else(|| Some("Configuration was rejected".to_owned()));
            }
            self.state = previous;
            return Ok(false);
        }

        info!("💾 Configuration saved: {}", patch);
        let warnings = response.warnings;
        // A failed reload falls back to this state
        self.state = previous;
        if let Err(e) = self.reload().await {
            warn!("Saved, but reloading failed: {}", e);
        }
        self.warnings = warnings;
        Ok(true)
    }

    /// Revert local edits to the last loaded document, no network involved
    pub fn reset(&mut self) {
        let Some(document) = &self.document else {
            return;
        };
        self.form = build_form_state(document, &self.schema);
        self.errors.clear();
        self.save_error = None;
        self.state = SessionState::Ready;
    }

    /// Ask the store to reset to defaults, then reload
    ///
    /// On failure local state is left untouched.
    pub async fn restore_defaults(&mut self) -> Result<()> {
        let previous = self.state;
        self.state = SessionState::Resetting;

        if let Err(e) = self.store.reset_config().await {
            warn!("Failed to restore defaults: {}", e);
            self.state = previous;
            return Err(SessionError::Reset(e));
        }

        info!("🔄 Configuration restored to defaults");
        self.warnings.clear();
        self.state = previous;
        self.reload().await
    }

    pub fn view(&self, key: &str) -> Option<FieldView> {
        let field = self.schema.field(key)?;
        let visibility = visibility::resolve(field, &self.form);
        let enabled = visibility.enabled && !field.disabled;
        let disabled_text = if enabled {
            None
        } else {
            visibility
                .disabled_text
                .or_else(|| field.disabled_text.clone())
        };

        Some(FieldView {
            key: field.key.clone(),
            label: field.label.clone(),
            helper: field.helper.clone(),
            field_type: field.field_type,
            value: self.form.value(key).to_owned(),
            error: self.errors.get(key).map(str::to_owned),
            enabled,
            disabled_text,
            options: field.options.clone(),
            companion_key: field.companion_key.clone(),
            subsection: field.subsection.clone(),
        })
    }

    /// Views in schema order
    pub fn views(&self) -> Vec<FieldView> {
        self.schema
            .iter()
            .filter_map(|field| self.view(&field.key))
            .collect()
    }

    /// Form differs from what was loaded
    pub fn is_dirty(&self) -> bool {
        self.form != self.baseline
    }

    /// Patch a save would send right now, without any extra patch
    pub fn pending_patch(&self) -> Option<Patch> {
        self.document
            .as_ref()
            .map(|document| build_patch(document, &self.form, &self.schema))
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn warnings(&self) -> &[SaveWarning] {
        &self.warnings
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn document(&self) -> Option<&ConfigDocument> {
        self.document.as_ref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::validation::REQUIRED;
    use fluxion_settings_types::{Field, FieldIssue, Relation};
    use serde_json::{Value, json};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("battery.capacity_kwh", "Capacity (kWh)", FieldType::Number),
            Field::new("battery.min_soc_percent", "Min SoC (%)", FieldType::Number),
            Field::new("battery.max_soc_percent", "Max SoC (%)", FieldType::Number),
            Field::new("system.has_water_heater", "Water heater", FieldType::Boolean),
            Field::new("water_heating.power_kw", "Heater power (kW)", FieldType::Number)
                .show_when("system.has_water_heater", true),
        ])
        .unwrap()
        .with_relations(vec![Relation::less_than(
            "battery.min_soc_percent",
            "battery.max_soc_percent",
        )])
        .unwrap()
    }

    fn document() -> ConfigDocument {
        json!({
            "battery": {"capacity_kwh": 10, "min_soc_percent": 10, "max_soc_percent": 95},
            "system": {"has_water_heater": true},
            "water_heating": {"power_kw": 3}
        })
    }

    async fn loaded() -> SettingsSession<Arc<MemoryStore>> {
        let store = Arc::new(MemoryStore::with_defaults(document(), json!({})));
        let mut session = SettingsSession::new(store, schema());
        session.load().await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_load_builds_form() {
        let session = loaded().await;
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.form().value("battery.capacity_kwh"), "10");
        assert!(!session.is_dirty());
        assert_eq!(session.views().len(), 5);
    }

    #[tokio::test]
    async fn test_edit_and_save_reloads() {
        let mut session = loaded().await;
        session.handle_change("battery.capacity_kwh", "12").unwrap();
        assert_eq!(session.state(), SessionState::Editing);
        assert!(session.is_dirty());

        assert!(session.save(None).await.unwrap());
        assert_eq!(session.state(), SessionState::Ready);
        assert!(!session.is_dirty());
        assert_eq!(
            session.store().saved_patches(),
            vec![json!({"battery": {"capacity_kwh": 12}})]
        );
        assert_eq!(session.store().fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_patch_skips_network() {
        let mut session = loaded().await;
        assert!(session.save(None).await.unwrap());
        assert!(session.store().saved_patches().is_empty());
        assert_eq!(session.store().fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_extra_patch_is_merged() {
        let mut session = loaded().await;
        let extra = json!({"ui": {"theme": "nord"}});
        assert!(session.save(Some(&extra)).await.unwrap());
        assert_eq!(session.store().saved_patches(), vec![extra]);
    }

    #[tokio::test]
    async fn test_errors_block_save() {
        let mut session = loaded().await;
        session.handle_change("battery.capacity_kwh", "").unwrap();
        assert_eq!(session.errors().get("battery.capacity_kwh"), Some(REQUIRED));
        assert!(!session.save(None).await.unwrap());
        assert!(session.store().saved_patches().is_empty());
    }

    #[tokio::test]
    async fn test_server_rejection_merges_errors() {
        let mut session = loaded().await;
        session
            .store()
            .reject_with(vec![FieldIssue::new("battery.capacity_kwh", "Too large")]);
        session.handle_change("battery.capacity_kwh", "500").unwrap();

        assert!(!session.save(None).await.unwrap());
        assert_eq!(session.errors().get("battery.capacity_kwh"), Some("Too large"));
        assert_eq!(session.form().value("battery.capacity_kwh"), "500");
        assert_eq!(session.state(), SessionState::Editing);
    }

    #[tokio::test]
    async fn test_transport_failure_applies_nothing() {
        let mut session = loaded().await;
        session.handle_change("battery.capacity_kwh", "12").unwrap();
        session.store().set_offline(true);

        let result = session.save(None).await;
        assert!(matches!(result, Err(SessionError::SaveTransport(_))));
        assert!(session.save_error().is_some());
        assert!(session.is_dirty());
        assert_eq!(session.store().document(), document());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_state() {
        let mut session = loaded().await;
        session.store().set_offline(true);
        assert!(matches!(session.reload().await, Err(SessionError::Load(_))));
        assert!(session.load_error().is_some());
        assert_eq!(session.document(), Some(&document()));
        assert_eq!(session.form().value("battery.capacity_kwh"), "10");
    }

    #[tokio::test]
    async fn test_toggle_revalidates_dependents() {
        let mut session = loaded().await;
        session.handle_change("water_heating.power_kw", "").unwrap();
        assert_eq!(session.errors().get("water_heating.power_kw"), Some(REQUIRED));

        session.handle_change("system.has_water_heater", "false").unwrap();
        assert!(!session.errors().has_errors());
        let view = session.view("water_heating.power_kw").unwrap();
        assert!(!view.enabled);
    }

    #[tokio::test]
    async fn test_unknown_field_rejected() {
        let mut session = loaded().await;
        assert!(matches!(
            session.handle_change("nope", "1"),
            Err(SessionError::UnknownField(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_reverts_locally() {
        let mut session = loaded().await;
        session.handle_change("battery.min_soc_percent", "99").unwrap();
        assert!(session.errors().has_errors());

        session.reset();
        assert!(!session.errors().has_errors());
        assert!(!session.is_dirty());
        assert_eq!(session.store().fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_restore_defaults() {
        let mut session = loaded().await;
        session.restore_defaults().await.unwrap();
        assert_eq!(session.document(), Some(&json!({})));
        assert_eq!(session.form().value("battery.capacity_kwh"), "");

        session.store().set_offline(true);
        session.handle_change("battery.capacity_kwh", "5").unwrap();
        assert!(matches!(
            session.restore_defaults().await,
            Err(SessionError::Reset(_))
        ));
        assert_eq!(session.form().value("battery.capacity_kwh"), "5");
        assert_eq!(session.state(), SessionState::Editing);
    }

    #[tokio::test]
    async fn test_save_warnings_survive_reload() {
        let mut session = loaded().await;
        session.store().warn_with(vec![SaveWarning {
            message: "Water heater enabled but power is 0".to_owned(),
            guidance: Some("Set water_heating.power_kw".to_owned()),
        }]);
        session.handle_change("water_heating.power_kw", "0").unwrap();
        assert!(session.save(None).await.unwrap());
        assert_eq!(session.warnings().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_reload_after_save_keeps_session_usable() {
        let mut session = loaded().await;
        session.handle_change("battery.capacity_kwh", "12").unwrap();
        session.store().fail_next_fetch();

        assert!(session.save(None).await.unwrap());
        assert_eq!(session.state(), SessionState::Editing);
        assert!(session.load_error().is_some());

        session.handle_change("battery.capacity_kwh", "13").unwrap();
        assert!(session.save(None).await.unwrap());
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.store().document()["battery"]["capacity_kwh"], 13);
    }

    #[tokio::test]
    async fn test_failed_reload_after_restore_defaults() {
        let mut session = loaded().await;
        session.store().fail_next_fetch();

        assert!(matches!(
            session.restore_defaults().await,
            Err(SessionError::Load(_))
        ));
        assert_eq!(session.state(), SessionState::Ready);

        session.reload().await.unwrap();
        assert_eq!(session.document(), Some(&json!({})));
        session.handle_change("battery.capacity_kwh", "8").unwrap();
        assert!(session.save(None).await.unwrap());
        assert_eq!(
            session.store().saved_patches(),
            vec![json!({"battery": {"capacity_kwh": 8}})]
        );
    }

    #[tokio::test]
    async fn test_non_object_extra_patch_refused() {
        let mut session = loaded().await;
        session.handle_change("battery.capacity_kwh", "12").unwrap();

        assert!(!session.save(Some(&Value::Null)).await.unwrap());
        assert!(!session.save(Some(&json!(5))).await.unwrap());
        assert!(session.save_error().is_some());
        assert!(session.store().saved_patches().is_empty());
        assert!(session.is_dirty());

        assert!(session.save(None).await.unwrap());
        assert_eq!(
            session.store().saved_patches(),
            vec![json!({"battery": {"capacity_kwh": 12}})]
        );
    }

    #[tokio::test]
    async fn test_load_flags_invalid_stored_values() {
        let store = Arc::new(MemoryStore::new(json!({
            "battery": {"capacity_kwh": null, "min_soc_percent": 95, "max_soc_percent": 90},
            "system": {"has_water_heater": true}
        })));
        let mut session = SettingsSession::new(store, schema());
        session.load().await.unwrap();

        assert_eq!(session.errors().get("battery.capacity_kwh"), Some(REQUIRED));
        assert!(session.errors().get("battery.min_soc_percent").is_some());
        assert!(session.errors().get("battery.max_soc_percent").is_some());
        // Absent from the document, so not flagged
        assert!(session.errors().get("water_heating.power_kw").is_none());

        session.handle_change("system.has_water_heater", "false").unwrap();
        assert!(!session.save(None).await.unwrap());
        assert!(session.store().saved_patches().is_empty());
    }
}
