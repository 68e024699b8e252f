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

//! Error types for the configuration store server

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreServerError {
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("default config not found: {0}")]
    DefaultsMissing(String),

    #[error("stored document is not a JSON object")]
    NotAnObject,

    #[error("invalid theme '{name}': {reason}")]
    Theme { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, StoreServerError>;
