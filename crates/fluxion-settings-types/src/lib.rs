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

//! Plain data shared by the settings engine, the store client and the store server.
//!
//! Nothing in here has behaviour beyond construction checks: the field schema model
//! lives in [`schema`], the JSON shapes exchanged with the configuration store live
//! in [`wire`].

pub mod schema;
pub mod wire;

pub use schema::{Field, FieldType, Relation, Schema, SchemaError, SelectOption, ShowIf};
pub use wire::{
    EntitiesResponse, FieldIssue, HaEntity, SaveResponse, SaveStatus, SaveWarning,
    StatusResponse, ThemeInfo, ThemeSelectRequest, ThemesResponse,
};

/// Full nested configuration tree as persisted by the store.
pub type ConfigDocument = serde_json::Value;

/// Nested partial document holding only changed leaves.
pub type Patch = serde_json::Value;
