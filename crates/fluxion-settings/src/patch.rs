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

//! Minimal patch computation
//!
//! Only leaves whose parsed form value differs from the loaded document end up in
//! the patch. Inactive fields, unparseable input and empty numeric input are left
//! out entirely.

use crate::codec::{self, Parsed};
use crate::form::FormState;
use crate::path;
use crate::visibility::is_active;
use fluxion_settings_types::{ConfigDocument, Field, Patch, Schema};
use serde_json::{Map, Value};
use tracing::debug;

/// Nested object holding the changed leaves, `{}` when nothing changed
pub fn build_patch(original: &ConfigDocument, form: &FormState, schema: &Schema) -> Patch {
    let mut patch = Value::Object(Map::new());

    for field in schema {
        if !is_active(field, form) {
            continue;
        }

        let value = match codec::parse(field, form.value(&field.key)) {
            Parsed::Value(value) => value,
            Parsed::Unset => continue,
            Parsed::Invalid => {
                debug!("Skipping {}: not a valid {}", field.key, field.field_type);
                continue;
            }
        };

        let current = path::get(original, &field.path);
        if is_unchanged(field, &value, current) {
            continue;
        }

        debug!("Patching {} = {}", field.key, value);
        path::set_in_place(&mut patch, &field.path, value);
    }

    patch
}

/// Equal to the stored value, or to the stored value after a format/parse pass
fn is_unchanged(field: &Field, value: &Value, current: Option<&Value>) -> bool {
    if let Some(current) = current
        && codec::values_equal(value, current)
    {
        return true;
    }
    match codec::parse(field, &codec::format(field, current)) {
        Parsed::Value(baseline) => codec::values_equal(value, &baseline),
        Parsed::Unset | Parsed::Invalid => false,
    }
}

/// No changed leaves
pub fn is_empty_patch(patch: &Patch) -> bool {
    match patch {
        Value::Object(map) => map.is_empty(),
        Value::Null => true,
        Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Array(_) => false,
    }
}
