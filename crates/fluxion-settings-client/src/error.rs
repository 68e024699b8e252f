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

use fluxion_settings::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("client configuration error: {0}")]
    Config(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Store answered 200 but reported failure in the body
    #[error("request rejected: {0}")]
    Rejected(String),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

impl From<ClientError> for StoreError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Http(e) if e.is_decode() => StoreError::Decode(e.to_string()),
            ClientError::Http(e) => StoreError::Transport(e.to_string()),
            ClientError::Config(message) => StoreError::Transport(message),
            ClientError::AuthenticationFailed => StoreError::Status {
                status: 401,
                message: "authentication failed".to_owned(),
            },
            ClientError::NotFound(what) => StoreError::Status {
                status: 404,
                message: format!("{what} not found"),
            },
            ClientError::Api { status, message } => StoreError::Status { status, message },
            ClientError::Rejected(message) => StoreError::Status {
                status: 200,
                message,
            },
        }
    }
}
