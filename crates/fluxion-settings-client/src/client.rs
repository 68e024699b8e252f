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

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use fluxion_settings::{ConfigStore, StoreError};
use fluxion_settings_types::{
    ConfigDocument, EntitiesResponse, HaEntity, Patch, SaveResponse, SaveStatus, StatusResponse,
    ThemeSelectRequest, ThemesResponse,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Configuration store REST API client
#[derive(Debug, Clone)]
pub struct SettingsClient {
    base_url: String,
    token: Option<String>,
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl SettingsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(ClientError::Config("store base URL is empty".to_owned()));
        }

        Ok(Self {
            base_url,
            token: None,
            client,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// Send `Authorization: Bearer <token>` with every request
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set custom retry configuration
    #[must_use]
    pub fn with_retry_config(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay = retry_delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Fetch the current configuration document
    pub async fn get_config(&self) -> ClientResult<ConfigDocument> {
        let url = self.url("/api/config");
        debug!("🔍 [STORE] GET {}", url);

        let response = self
            .retry_request(|| async { self.authorize(self.client.get(&url)).send().await })
            .await?;
        let document: Value = check_status(response, "configuration").await?.json().await?;

        // The store reports read failures as `{"error": "..."}` with a 200
        if let Some(message) = document.get("error").and_then(Value::as_str) {
            error!("❌ [STORE] Failed to read configuration: {}", message);
            return Err(ClientError::Rejected(message.to_owned()));
        }
        if !document.is_object() {
            return Err(ClientError::Rejected(
                "configuration is not a JSON object".to_owned(),
            ));
        }
        Ok(document)
    }

    /// Send a patch to be deep-merged into the stored document
    pub async fn save_config(&self, patch: &Patch) -> ClientResult<SaveResponse> {
        let url = self.url("/api/config/save");
        info!("💾 [STORE] Saving patch: {}", patch);

        let response = self
            .authorize(self.client.post(&url))
            .json(patch)
            .send()
            .await?;
        let saved: SaveResponse = check_status(response, "configuration").await?.json().await?;

        match saved.status {
            SaveStatus::Success => info!("✅ [STORE] Saved ({} warning(s))", saved.warnings.len()),
            SaveStatus::Error => warn!("⚠️ [STORE] Rejected with {} issue(s)", saved.errors.len()),
        }
        Ok(saved)
    }

    /// Reset the stored document to shipped defaults
    pub async fn reset_config(&self) -> ClientResult<()> {
        let url = self.url("/api/config/reset");
        info!("🔄 [STORE] Resetting configuration to defaults");

        let response = self.authorize(self.client.post(&url)).send().await?;
        let status: StatusResponse = check_status(response, "defaults").await?.json().await?;
        match status.status {
            SaveStatus::Success => Ok(()),
            SaveStatus::Error => Err(ClientError::Rejected(
                status
                    .message
                    .unwrap_or_else(|| "reset failed".to_owned()),
            )),
        }
    }

    /// Home Assistant entities available for entity pickers
    pub async fn get_entities(&self) -> ClientResult<Vec<HaEntity>> {
        let url = self.url("/api/ha/entities");
        let response = self
            .retry_request(|| async { self.authorize(self.client.get(&url)).send().await })
            .await?;
        let body: EntitiesResponse = check_status(response, "entities").await?.json().await?;

        let entities = body
            .entities
            .into_iter()
            .map(|entity| {
                if entity.domain.is_empty() {
                    HaEntity::new(entity.entity_id, entity.friendly_name)
                } else {
                    entity
                }
            })
            .collect::<Vec<_>>();
        debug!("✅ [STORE] {} entities", entities.len());
        Ok(entities)
    }

    pub async fn get_themes(&self) -> ClientResult<ThemesResponse> {
        let url = self.url("/api/themes");
        let response = self
            .retry_request(|| async { self.authorize(self.client.get(&url)).send().await })
            .await?;
        Ok(check_status(response, "themes").await?.json().await?)
    }

    /// Persist a theme choice (and optionally its accent colour)
    pub async fn apply_theme(&self, theme: &str, accent_index: Option<u8>) -> ClientResult<()> {
        let url = self.url("/api/theme");
        let body = ThemeSelectRequest {
            theme: theme.to_owned(),
            accent_index,
        };
        info!("🎨 [STORE] Applying theme {}", theme);

        let response = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await?;
        check_status(response, &format!("theme '{theme}'")).await?;
        Ok(())
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut>(&self, mut request_fn: F) -> ClientResult<Response>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Response, reqwest::Error>>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay;

        loop {
            attempts += 1;
            match request_fn().await {
                Ok(response) => return Ok(response),
                Err(e) if attempts >= self.max_retries => {
                    error!("Request failed after {} attempts: {}", attempts, e);
                    return Err(ClientError::Http(e));
                }
                Err(e) => {
                    warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempts, self.max_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }
}

async fn check_status(response: Response, what: &str) -> ClientResult<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(ClientError::NotFound(what.to_owned())),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::AuthenticationFailed),
        status => {
            let message = response.text().await.unwrap_or_default();
            error!("❌ [STORE] Status {}: {}", status, message);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl ConfigStore for SettingsClient {
    async fn fetch_config(&self) -> Result<ConfigDocument, StoreError> {
        Ok(self.get_config().await?)
    }

    async fn save_config(&self, patch: &Patch) -> Result<SaveResponse, StoreError> {
        Ok(SettingsClient::save_config(self, patch).await?)
    }

    async fn reset_config(&self) -> Result<(), StoreError> {
        Ok(SettingsClient::reset_config(self).await?)
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}
