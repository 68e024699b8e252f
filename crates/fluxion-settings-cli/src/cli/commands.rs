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

//! Command implementations, generic over the store so they run against any backend

use anyhow::{Context, Result};
use fluxion_settings::catalog::{self, Tab};
use fluxion_settings::{ConfigStore, FieldView, SettingsSession, is_empty_patch};
use fluxion_settings_types::{Patch, SaveWarning};
use tracing::info;

/// What `set` did
#[derive(Debug, PartialEq)]
pub enum SetOutcome {
    /// Local validation failed, nothing was sent
    Invalid(Vec<(String, String)>),
    /// Values already match the stored document
    Unchanged,
    DryRun(Patch),
    Saved(Vec<SaveWarning>),
    /// The store refused the patch
    Rejected(Vec<(String, String)>),
}

fn errors_of<S: ConfigStore>(session: &SettingsSession<S>) -> Vec<(String, String)> {
    let mut errors: Vec<(String, String)> = session
        .errors()
        .iter()
        .map(|(key, message)| (key.to_owned(), message.to_owned()))
        .collect();
    if errors.is_empty()
        && let Some(message) = session.save_error()
    {
        errors.push((String::new(), message.to_owned()));
    }
    errors
}

async fn open_session<S: ConfigStore>(store: S) -> Result<SettingsSession<S>> {
    let schema = catalog::standard().context("Built-in settings catalog is invalid")?;
    let mut session = SettingsSession::new(store, schema);
    session
        .load()
        .await
        .context("Failed to load configuration")?;
    Ok(session)
}

/// Field views for the whole catalog or one tab
pub async fn show<S: ConfigStore>(store: S, tab: Option<Tab>) -> Result<Vec<FieldView>> {
    let session = open_session(store).await?;
    let views = session.views();

    let Some(tab) = tab else {
        return Ok(views);
    };
    let tab_schema = tab.schema().context("Built-in settings catalog is invalid")?;
    Ok(views
        .into_iter()
        .filter(|view| tab_schema.contains(&view.key))
        .collect())
}

/// Apply assignments through a session so they get the same checks as the dashboard
pub async fn set<S: ConfigStore>(
    store: S,
    assignments: &[(String, String)],
    dry_run: bool,
) -> Result<SetOutcome> {
    let mut session = open_session(store).await?;

    for (key, value) in assignments {
        session
            .handle_change(key, value.as_str())
            .with_context(|| format!("Cannot set '{key}'"))?;
    }
    if session.errors().has_errors() {
        return Ok(SetOutcome::Invalid(errors_of(&session)));
    }

    let patch = session.pending_patch().unwrap_or_default();
    if is_empty_patch(&patch) {
        return Ok(SetOutcome::Unchanged);
    }
    if dry_run {
        return Ok(SetOutcome::DryRun(patch));
    }

    if session.save(None).await.context("Failed to save configuration")? {
        info!("💾 Saved {} field(s)", assignments.len());
        Ok(SetOutcome::Saved(session.warnings().to_vec()))
    } else {
        Ok(SetOutcome::Rejected(errors_of(&session)))
    }
}

pub async fn restore_defaults<S: ConfigStore>(store: S) -> Result<()> {
    let mut session = open_session(store).await?;
    session
        .restore_defaults()
        .await
        .context("Failed to restore defaults")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxion_settings::MemoryStore;
    use fluxion_settings_types::FieldIssue;
    use serde_json::json;
    use std::sync::Arc;

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_defaults(
            json!({
                "timezone": "Europe/Prague",
                "system": {"has_battery": true, "has_water_heater": false},
                "battery": {"capacity_kwh": 10, "min_soc_percent": 10, "max_soc_percent": 90},
                "water_heating": {"power_kw": 2}
            }),
            json!({"timezone": "Europe/Prague", "battery": {"capacity_kwh": 5}}),
        ))
    }

    fn set_args(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[tokio::test]
    async fn test_show_filters_by_tab() {
        let all = show(store(), None).await.unwrap();
        let ui = show(store(), Some(Tab::Ui)).await.unwrap();
        assert!(ui.len() < all.len());
        assert!(ui.iter().all(|v| v.key.starts_with("ui.")));
    }

    #[tokio::test]
    async fn test_set_saves_minimal_patch() {
        let store = store();
        let outcome = set(
            Arc::clone(&store),
            &set_args(&[("battery.capacity_kwh", "12"), ("battery.min_soc_percent", "10")]),
            false,
        )
        .await
        .unwrap();

        assert_eq!(outcome, SetOutcome::Saved(Vec::new()));
        assert_eq!(
            store.saved_patches(),
            vec![json!({"battery": {"capacity_kwh": 12}})]
        );
    }

    #[tokio::test]
    async fn test_set_dry_run_does_not_save() {
        let store = store();
        let outcome = set(
            Arc::clone(&store),
            &set_args(&[("battery.max_soc_percent", "95")]),
            true,
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            SetOutcome::DryRun(json!({"battery": {"max_soc_percent": 95}}))
        );
        assert!(store.saved_patches().is_empty());
    }

    #[tokio::test]
    async fn test_set_invalid_values() {
        let outcome = set(
            store(),
            &set_args(&[("battery.min_soc_percent", "95")]),
            false,
        )
        .await
        .unwrap();

        let SetOutcome::Invalid(errors) = outcome else {
            panic!("expected local validation failure");
        };
        assert!(errors.iter().any(|(key, _)| key == "battery.min_soc_percent"));
    }

    #[tokio::test]
    async fn test_set_unchanged_and_unknown() {
        let outcome = set(store(), &set_args(&[("battery.capacity_kwh", "10")]), false)
            .await
            .unwrap();
        assert_eq!(outcome, SetOutcome::Unchanged);

        assert!(set(store(), &set_args(&[("battery.colour", "red")]), false)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_set_rejected_by_store() {
        let store = store();
        store.reject_with(vec![FieldIssue::new(
            "battery.capacity_kwh",
            "Battery capacity must be greater than 0.",
        )]);
        let outcome = set(
            Arc::clone(&store),
            &set_args(&[("battery.capacity_kwh", "11")]),
            false,
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            SetOutcome::Rejected(vec![(
                "battery.capacity_kwh".to_owned(),
                "Battery capacity must be greater than 0.".to_owned()
            )])
        );
    }

    #[tokio::test]
    async fn test_restore_defaults() {
        let store = store();
        restore_defaults(Arc::clone(&store)).await.unwrap();
        assert_eq!(store.document()["battery"]["capacity_kwh"], 5);
    }
}
