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

use crate::config::StoreServerConfig;
use crate::error::StoreServerError;
use crate::persistence::ConfigFile;
use crate::themes::{PALETTE_SIZE, load_themes};
use crate::validation::{ensure_critical_defaults, strip_secrets, validate_document};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use fluxion_settings::path;
use fluxion_settings_types::{
    EntitiesResponse, HaEntity, SaveResponse, StatusResponse, ThemeInfo, ThemesResponse,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

#[derive(Debug)]
struct StoredDocument {
    config: Value,
    version: u64,
    /// Set when the stored file could not be read at startup
    load_error: Option<String>,
}

/// Shared state for the store endpoints
#[derive(Clone)]
pub struct StoreState {
    document: Arc<RwLock<StoredDocument>>,
    files: Arc<ConfigFile>,
    themes_dir: Option<PathBuf>,
    entities: Arc<Vec<HaEntity>>,
}

impl std::fmt::Debug for StoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreState")
            .field("document", &"<RwLock>")
            .field("config_path", &self.files.path())
            .field("themes_dir", &self.themes_dir)
            .field("entities", &self.entities.len())
            .finish()
    }
}

impl StoreState {
    pub fn new(
        config: Value,
        files: ConfigFile,
        themes_dir: Option<PathBuf>,
        entities: Vec<HaEntity>,
    ) -> Self {
        Self {
            document: Arc::new(RwLock::new(StoredDocument {
                config,
                version: 0,
                load_error: None,
            })),
            files: Arc::new(files),
            themes_dir,
            entities: Arc::new(entities),
        }
    }

    /// Build state from server config, loading (or seeding) the stored document.
    ///
    /// A document that cannot be read does not stop the server: reads report
    /// the failure and writes are refused until a reset succeeds.
    pub fn from_config(config: &StoreServerConfig) -> Self {
        let files = ConfigFile::new(&config.storage.config_path, &config.storage.defaults_path);
        let entities = config
            .home_assistant
            .entities
            .iter()
            .map(|e| HaEntity::new(e.entity_id.clone(), e.friendly_name.clone()))
            .collect();
        let themes_dir = config.storage.themes_dir.as_ref().map(PathBuf::from);

        let (document, version, load_error) = match files.load_or_seed() {
            Ok((document, metadata)) => {
                info!("📄 Loaded configuration from {}", files.path().display());
                (document, metadata.map_or(0, |m| m.version), None)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                (json!({}), 0, Some(e.to_string()))
            }
        };

        let state = Self::new(document, files, themes_dir, entities);
        {
            let mut stored = state.document.write();
            stored.version = version;
            stored.load_error = load_error;
        }
        state
    }

    /// Current document, secrets included
    pub fn document(&self) -> Value {
        self.document.read().config.clone()
    }

    pub fn version(&self) -> u64 {
        self.document.read().version
    }

    fn themes(&self) -> std::collections::BTreeMap<String, ThemeInfo> {
        self.themes_dir
            .as_deref()
            .map(load_themes)
            .unwrap_or_default()
    }
}

pub fn router(state: StoreState) -> Router {
    Router::new()
        .route("/api/config", get(get_config_handler))
        .route("/api/config/save", post(save_config_handler))
        .route("/api/config/reset", post(reset_config_handler))
        .route("/api/ha/entities", get(entities_handler))
        .route("/api/themes", get(themes_handler))
        .route("/api/theme", post(select_theme_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// GET /api/config - document without credentials
pub async fn get_config_handler(State(state): State<StoreState>) -> Json<Value> {
    let stored = state.document.read();
    match &stored.load_error {
        Some(message) => Json(json!({ "error": message })),
        None => Json(strip_secrets(&stored.config)),
    }
}

/// POST /api/config/save - deep-merge a patch, validate, persist
pub async fn save_config_handler(
    State(state): State<StoreState>,
    Json(patch): Json<Value>,
) -> Result<Json<SaveResponse>, ApiError> {
    if !patch.is_object() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Patch must be a JSON object",
        ));
    }

    // Held across merge and write so concurrent saves cannot interleave
    let mut stored = state.document.write();
    if let Some(message) = &stored.load_error {
        return Err(api_error(StatusCode::SERVICE_UNAVAILABLE, message.clone()));
    }

    let mut merged = stored.config.clone();
    path::merge(&mut merged, patch);
    ensure_critical_defaults(&mut merged);

    let report = validate_document(&merged);
    if !report.is_valid() {
        warn!(
            "⚠️ Rejected configuration save: {} issue(s)",
            report.errors.len()
        );
        return Ok(Json(SaveResponse::rejected(report.errors)));
    }

    let version = stored.version + 1;
    state
        .files
        .save(&merged, "api", version)
        .map_err(|e| {
            error!("❌ Failed to persist configuration: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    stored.config = merged;
    stored.version = version;
    info!(
        "✅ Configuration v{} saved ({} warning(s))",
        version,
        report.warnings.len()
    );
    Ok(Json(SaveResponse::success(report.warnings)))
}

/// POST /api/config/reset - replace the document with shipped defaults
pub async fn reset_config_handler(
    State(state): State<StoreState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let defaults = match state.files.load_defaults() {
        Ok(defaults) => defaults,
        Err(StoreServerError::DefaultsMissing(_)) => {
            return Ok(Json(StatusResponse::error("Default config not found")));
        }
        Err(e) => {
            error!("❌ Failed to read defaults: {}", e);
            return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let mut stored = state.document.write();
    let version = stored.version + 1;
    state
        .files
        .save(&defaults, "reset", version)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    stored.config = defaults;
    stored.version = version;
    stored.load_error = None;
    info!("🔄 Configuration reset to defaults (v{})", version);
    Ok(Json(StatusResponse::ok()))
}

/// GET /api/ha/entities
pub async fn entities_handler(State(state): State<StoreState>) -> Json<EntitiesResponse> {
    Json(EntitiesResponse {
        entities: state.entities.as_ref().clone(),
    })
}

fn accent_from(value: Option<&Value>) -> Option<u8> {
    let value = value?;
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .and_then(|v| u8::try_from(v).ok())
}

/// GET /api/themes - available themes and the current choice
pub async fn themes_handler(State(state): State<StoreState>) -> Json<ThemesResponse> {
    let themes = state.themes();
    let config = state.document();

    let selected = path::get(&config, &["ui", "theme"]).and_then(Value::as_str);
    let current = selected
        .filter(|name| themes.contains_key(*name))
        .map(str::to_owned)
        .or_else(|| themes.keys().next().cloned());
    let accent_index = accent_from(path::get(&config, &["ui", "theme_accent_index"]));

    Json(ThemesResponse {
        current,
        accent_index,
        themes: themes.into_values().collect(),
    })
}

#[derive(Debug, Deserialize)]
pub struct SelectThemeRequest {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub accent_index: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SelectThemeResponse {
    pub status: &'static str,
    pub current: String,
    pub accent_index: Option<i64>,
    pub theme: ThemeInfo,
}

/// POST /api/theme - persist a theme and accent colour
pub async fn select_theme_handler(
    State(state): State<StoreState>,
    Json(request): Json<SelectThemeRequest>,
) -> Result<Json<SelectThemeResponse>, ApiError> {
    let mut themes = state.themes();
    let name = request.theme.unwrap_or_default();
    let Some(theme) = themes.remove(&name) else {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Theme '{name}' not found"),
        ));
    };

    // Unparseable indices are ignored rather than rejected
    let accent_index = request.accent_index.as_ref().and_then(|v| {
        v.as_i64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
    });
    if let Some(index) = accent_index
        && usize::try_from(index).ok().is_none_or(|i| i >= PALETTE_SIZE)
    {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "accent_index must be between 0 and 15",
        ));
    }

    let mut stored = state.document.write();
    if let Some(message) = &stored.load_error {
        return Err(api_error(StatusCode::SERVICE_UNAVAILABLE, message.clone()));
    }
    let mut updated = stored.config.clone();
    path::set_in_place(&mut updated, &["ui", "theme"], json!(name));
    if let Some(index) = accent_index {
        path::set_in_place(&mut updated, &["ui", "theme_accent_index"], json!(index));
    }

    let version = stored.version + 1;
    state
        .files
        .save(&updated, "theme", version)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    stored.config = updated;
    stored.version = version;
    info!("🎨 Theme set to {}", name);

    Ok(Json(SelectThemeResponse {
        status: "success",
        current: name,
        accent_index,
        theme,
    }))
}
