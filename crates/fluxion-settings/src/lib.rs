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

//! Schema-driven settings engine
//!
//! Turns a nested configuration document into a flat string form, validates edits,
//! resolves conditional visibility and computes the minimal patch to persist.
//! [`session::SettingsSession`] ties it together against any [`store::ConfigStore`].

pub mod catalog;
pub mod codec;
pub mod error;
pub mod form;
pub mod patch;
pub mod path;
pub mod session;
pub mod store;
pub mod validation;
pub mod visibility;

pub use codec::Parsed;
pub use error::{Result, SessionError};
pub use form::{FormState, build_form_state};
pub use patch::{build_patch, is_empty_patch};
pub use session::{FieldView, SessionState, SettingsSession};
pub use store::{ConfigStore, MemoryStore, StoreError};
pub use validation::{FieldErrors, ValidationUpdate, validate_field, validate_form};
pub use visibility::{Visibility, is_active};

pub use fluxion_settings_types::{
    ConfigDocument, Field, FieldType, Patch, Relation, Schema, SchemaError, SelectOption, ShowIf,
};
