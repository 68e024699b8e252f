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

//! Load, edit, reset and save through a session backed by the in-memory store

use fluxion_settings::{MemoryStore, SessionState, SettingsSession, catalog};
use serde_json::json;
use std::sync::Arc;

fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_defaults(
        json!({
            "timezone": "Europe/Stockholm",
            "system": {"has_battery": true, "has_water_heater": true},
            "battery": {"capacity_kwh": 10, "min_soc_percent": 10, "max_soc_percent": 95},
            "water_heating": {"power_kw": 3}
        }),
        json!({
            "timezone": "Europe/Stockholm",
            "system": {"has_battery": false},
            "nordpool": {"resolution_minutes": 15}
        }),
    ))
}

#[tokio::test]
async fn test_load_edit_reset() {
    let store = store();
    let mut session = SettingsSession::new(Arc::clone(&store), catalog::standard().unwrap());
    session.load().await.unwrap();

    session.handle_change("battery.capacity_kwh", "12").unwrap();
    assert_eq!(session.pending_patch(), Some(json!({"battery": {"capacity_kwh": 12}})));
    assert!(session.is_dirty());

    session.reset();
    assert_eq!(session.form().value("battery.capacity_kwh"), "10");
    assert_eq!(session.state(), SessionState::Ready);
    assert!(!session.is_dirty());
    assert_eq!(store.fetch_count(), 1);
}

#[tokio::test]
async fn test_save_then_reload_reflects_store() {
    let store = store();
    let mut session = SettingsSession::new(Arc::clone(&store), catalog::standard().unwrap());
    session.load().await.unwrap();

    session.handle_change("battery.max_soc_percent", "90").unwrap();
    session.handle_change("system.has_water_heater", "false").unwrap();
    // Hidden now, so this edit is dropped
    session.handle_change("water_heating.power_kw", "7").unwrap();

    assert!(session.save(None).await.unwrap());
    assert_eq!(
        store.saved_patches(),
        vec![json!({
            "battery": {"max_soc_percent": 90},
            "system": {"has_water_heater": false}
        })]
    );
    assert_eq!(session.form().value("water_heating.power_kw"), "3");
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn test_invalid_soc_pair_blocks_save_until_fixed() {
    let store = store();
    let mut session = SettingsSession::new(Arc::clone(&store), catalog::standard().unwrap());
    session.load().await.unwrap();

    session.handle_change("battery.min_soc_percent", "96").unwrap();
    let view = session.view("battery.max_soc_percent").unwrap();
    assert!(view.error.is_some());
    assert!(!session.save(None).await.unwrap());

    session.handle_change("battery.max_soc_percent", "100").unwrap();
    assert!(!session.errors().has_errors());
    assert!(session.save(None).await.unwrap());
    assert_eq!(store.saved_patches().len(), 1);
}

#[tokio::test]
async fn test_restore_defaults_reloads() {
    let store = store();
    let mut session = SettingsSession::new(Arc::clone(&store), catalog::standard().unwrap());
    session.load().await.unwrap();

    session.restore_defaults().await.unwrap();
    assert_eq!(session.form().value("system.has_battery"), "false");
    let view = session.view("battery.capacity_kwh").unwrap();
    assert!(!view.enabled);
}

#[tokio::test]
async fn test_store_outage_after_save_does_not_wedge_session() {
    let store = store();
    let mut session = SettingsSession::new(Arc::clone(&store), catalog::standard().unwrap());
    session.load().await.unwrap();

    session.handle_change("battery.max_soc_percent", "90").unwrap();
    store.fail_next_fetch();
    assert!(session.save(None).await.unwrap());
    assert_eq!(session.state(), SessionState::Editing);

    session.handle_change("battery.max_soc_percent", "85").unwrap();
    assert!(session.save(None).await.unwrap());
    assert_eq!(store.document()["battery"]["max_soc_percent"], 85);

    store.fail_next_fetch();
    assert!(session.restore_defaults().await.is_err());
    assert_eq!(session.state(), SessionState::Ready);
    session.reload().await.unwrap();
    assert_eq!(session.form().value("system.has_battery"), "false");
}
