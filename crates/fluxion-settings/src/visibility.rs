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

//! Conditional visibility of fields
//!
//! Predicates are evaluated against the live form, not the loaded document, so a
//! toggle takes effect on dependent fields before it is saved.

use crate::codec;
use crate::form::FormState;
use fluxion_settings_types::Field;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_text: Option<String>,
}

impl Visibility {
    fn shown() -> Self {
        Self {
            enabled: true,
            disabled_text: None,
        }
    }

    fn hidden(disabled_text: Option<String>) -> Self {
        Self {
            enabled: false,
            disabled_text,
        }
    }
}

/// Evaluate `show_if`, `show_if_all` and `show_if_any`; every present predicate must hold
pub fn resolve(field: &Field, form: &FormState) -> Visibility {
    if let Some(show_if) = &field.show_if
        && !matches_value(form.value(&show_if.config_key), &show_if.value)
    {
        let text = show_if
            .disabled_text
            .clone()
            .or_else(|| field.disabled_text.clone());
        return Visibility::hidden(text);
    }

    let all_hold = field.show_if_all.iter().all(|key| is_truthy(form.value(key)));
    let any_holds = field.show_if_any.is_empty()
        || field.show_if_any.iter().any(|key| is_truthy(form.value(key)));

    if all_hold && any_holds {
        Visibility::shown()
    } else {
        Visibility::hidden(field.disabled_text.clone())
    }
}

/// Editable, validated and patched: not read-only and currently visible
pub fn is_active(field: &Field, form: &FormState) -> bool {
    !field.disabled && resolve(field, form).enabled
}

/// Compare a form string with a typed expectation
pub fn matches_value(raw: &str, expected: &Value) -> bool {
    let raw = raw.trim();
    match expected {
        Value::Bool(true) => raw == "true",
        Value::Bool(false) => raw == "false" || raw.is_empty(),
        Value::Number(_) => {
            codec::parse_number(raw).is_some_and(|value| codec::values_equal(&value, expected))
        }
        Value::String(s) => raw == s.trim(),
        Value::Null => raw.is_empty(),
        Value::Array(_) | Value::Object(_) => raw == codec::format_value(expected),
    }
}

/// Non-empty, not `"false"` and not numerically zero
pub fn is_truthy(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.is_empty() || raw == "false" {
        return false;
    }
    !codec::parse_number(raw)
        .and_then(|value| value.as_f64())
        .is_some_and(|number| number == 0.0)
}
