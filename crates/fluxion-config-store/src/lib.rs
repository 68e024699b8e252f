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

//! Reference configuration store for the FluxION settings engine
//!
//! Serves one JSON document over HTTP. Saves are deep-merged into the stored
//! document, validated, then written atomically to disk.

pub mod api;
pub mod config;
pub mod error;
pub mod persistence;
pub mod themes;
pub mod validation;

pub use api::{StoreState, router};
pub use config::StoreServerConfig;
pub use error::{Result, StoreServerError};

use tracing::info;

/// Bind and serve the store until the server stops
pub async fn serve(config: &StoreServerConfig) -> anyhow::Result<()> {
    let state = StoreState::from_config(config);
    let app = router(state);

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    info!("🌐 Starting configuration store on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
