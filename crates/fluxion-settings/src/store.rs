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

//! Configuration store abstraction
//!
//! The session only knows this trait; the HTTP client and the in-memory store used
//! by tests and dry runs both implement it.

use crate::path;
use async_trait::async_trait;
use fluxion_settings_types::{ConfigDocument, FieldIssue, Patch, SaveResponse, SaveWarning};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Transport(String),

    #[error("store rejected request ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("invalid store response: {0}")]
    Decode(String),
}

/// Remote (or local) owner of the configuration document
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch the full current document
    async fn fetch_config(&self) -> Result<ConfigDocument, StoreError>;

    /// Deep-merge a patch into the stored document
    ///
    /// Validation failures come back as `Ok` with `status: error`; `Err` means
    /// the store could not be reached or answered garbage.
    async fn save_config(&self, patch: &Patch) -> Result<SaveResponse, StoreError>;

    /// Replace the stored document with the shipped defaults
    async fn reset_config(&self) -> Result<(), StoreError>;

    /// Store name for logging
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ConfigStore + ?Sized> ConfigStore for Arc<T> {
    async fn fetch_config(&self) -> Result<ConfigDocument, StoreError> {
        (**self).fetch_config().await
    }

    async fn save_config(&self, patch: &Patch) -> Result<SaveResponse, StoreError> {
        (**self).save_config(patch).await
    }

    async fn reset_config(&self) -> Result<(), StoreError> {
        (**self).reset_config().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    document: Value,
    defaults: Value,
    saved: Vec<Patch>,
    fetches: usize,
    rejections: Vec<FieldIssue>,
    warnings: Vec<SaveWarning>,
    offline: bool,
    fail_next_fetch: bool,
}

/// In-process store holding the document in memory
///
/// Scriptable: can reject the next saves with field issues, attach warnings, or
/// behave as unreachable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new(document: Value) -> Self {
        Self::with_defaults(document, json!({}))
    }

    pub fn with_defaults(document: Value, defaults: Value) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                document,
                defaults,
                ..MemoryInner::default()
            }),
        }
    }

    pub fn document(&self) -> Value {
        self.inner.lock().document.clone()
    }

    /// Replace the document behind the session's back
    pub fn replace_document(&self, document: Value) {
        self.inner.lock().document = document;
    }

    /// Patches accepted so far, oldest first
    pub fn saved_patches(&self) -> Vec<Patch> {
        self.inner.lock().saved.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.inner.lock().fetches
    }

    /// Answer saves with `status: error` and these issues until cleared
    pub fn reject_with(&self, issues: Vec<FieldIssue>) {
        self.inner.lock().rejections = issues;
    }

    pub fn warn_with(&self, warnings: Vec<SaveWarning>) {
        self.inner.lock().warnings = warnings;
    }

    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }

    /// Fail only the next fetch, saves and resets keep working
    pub fn fail_next_fetch(&self) {
        self.inner.lock().fail_next_fetch = true;
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn fetch_config(&self) -> Result<ConfigDocument, StoreError> {
        let mut inner = self.inner.lock();
        if inner.offline {
            return Err(StoreError::Transport("memory store offline".to_owned()));
        }
        if inner.fail_next_fetch {
            inner.fail_next_fetch = false;
            return Err(StoreError::Transport("memory store fetch failed".to_owned()));
        }
        inner.fetches += 1;
        Ok(inner.document.clone())
    }

    async fn save_config(&self, patch: &Patch) -> Result<SaveResponse, StoreError> {
        let mut inner = self.inner.lock();
        if inner.offline {
            return Err(StoreError::Transport("memory store offline".to_owned()));
        }
        if !inner.rejections.is_empty() {
            return Ok(SaveResponse::rejected(inner.rejections.clone()));
        }
        path::merge(&mut inner.document, patch.clone());
        inner.saved.push(patch.clone());
        Ok(SaveResponse::success(inner.warnings.clone()))
    }

    async fn reset_config(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.offline {
            return Err(StoreError::Transport("memory store offline".to_owned()));
        }
        inner.document = inner.defaults.clone();
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
