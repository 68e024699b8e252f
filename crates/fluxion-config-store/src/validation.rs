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

//! Server-side checks run on the merged document before it is persisted

use fluxion_settings::path;
use fluxion_settings_types::{FieldIssue, SaveWarning};
use serde_json::{Map, Value, json};

/// Secrets never returned by `GET /api/config`
const SECRET_PATHS: &[(&str, &str)] = &[
    ("home_assistant", "token"),
    ("notifications", "api_key"),
    ("notifications", "token"),
    ("notifications", "password"),
    ("notifications", "webhook_url"),
];

/// Outcome of validating a merged document
#[derive(Debug, Default)]
pub struct DocumentReport {
    pub errors: Vec<FieldIssue>,
    pub warnings: Vec<SaveWarning>,
}

impl DocumentReport {
    fn error(&mut self, field: &str, message: &str) {
        self.errors.push(FieldIssue::new(field, message));
    }

    fn warn(&mut self, message: &str, guidance: &str) {
        self.warnings.push(SaveWarning {
            message: message.to_owned(),
            guidance: Some(guidance.to_owned()),
        });
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Numbers and numeric strings; anything else is not a number
fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Integers, floats truncated toward zero, integer strings
#[expect(clippy::cast_possible_truncation)]
fn to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lookup<'a>(document: &'a Value, dotted: &str) -> Option<&'a Value> {
    let segments: Vec<&str> = dotted.split('.').collect();
    path::get(document, &segments).filter(|v| !v.is_null())
}

fn is_enabled(document: &Value, dotted: &str) -> bool {
    lookup(document, dotted).is_some_and(|v| v.as_bool() == Some(true))
}

/// Validate a merged document. Errors block the save, warnings do not.
pub fn validate_document(document: &Value) -> DocumentReport {
    let mut report = DocumentReport::default();

    check_battery(document, &mut report);
    check_nordpool(document, &mut report);

    let timezone_missing = match document.get("timezone") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    };
    if timezone_missing {
        report.error("timezone", "Timezone is required.");
    }

    check_s_index(document, &mut report);
    check_learning(document, &mut report);
    check_toggles(document, &mut report);

    report
}

fn check_battery(document: &Value, report: &mut DocumentReport) {
    if let Some(capacity) = lookup(document, "battery.capacity_kwh") {
        match to_f64(capacity) {
            Some(v) if v <= 0.0 => report.error(
                "battery.capacity_kwh",
                "Battery capacity must be greater than 0.",
            ),
            Some(_) => {}
            None => report.error("battery.capacity_kwh", "Battery capacity must be a number."),
        }
    }

    // A non-numeric bound disables both range checks
    let min_raw = lookup(document, "battery.min_soc_percent");
    let max_raw = lookup(document, "battery.max_soc_percent");
    let min_soc = min_raw.map(to_f64);
    let max_soc = max_raw.map(to_f64);
    let (min_soc, max_soc) = if matches!(min_soc, Some(None)) || matches!(max_soc, Some(None)) {
        (None, None)
    } else {
        (min_soc.flatten(), max_soc.flatten())
    };

    if let Some(min) = min_soc
        && !(0.0..=100.0).contains(&min)
    {
        report.error("battery.min_soc_percent", "Min SoC must be between 0 and 100.");
    }
    if let Some(max) = max_soc
        && !(0.0..=100.0).contains(&max)
    {
        report.error("battery.max_soc_percent", "Max SoC must be between 0 and 100.");
    }
    if let (Some(min), Some(max)) = (min_soc, max_soc)
        && min >= max
    {
        report.error(
            "battery.min_soc_percent",
            "Min SoC must be strictly less than Max SoC.",
        );
    }

    for field in ["battery.max_charge_power_kw", "battery.max_discharge_power_kw"] {
        if let Some(limit) = lookup(document, field) {
            match to_f64(limit) {
                Some(v) if v < 0.0 => report.error(field, "Power limit must be zero or positive."),
                Some(_) => {}
                None => report.error(field, "Power limit must be a number."),
            }
        }
    }
}

fn check_nordpool(document: &Value, report: &mut DocumentReport) {
    if let Some(resolution) = lookup(document, "nordpool.resolution_minutes") {
        match to_i64(resolution) {
            Some(15 | 30 | 60) => {}
            Some(_) => report.error(
                "nordpool.resolution_minutes",
                "Resolution must be one of 15, 30, or 60 minutes.",
            ),
            None => report.error("nordpool.resolution_minutes", "Resolution must be an integer."),
        }
    }
}

fn check_s_index(document: &Value, report: &mut DocumentReport) {
    // Older documents carry `static_factor` instead of `base_factor`
    let base_raw = lookup(document, "s_index.base_factor")
        .or_else(|| lookup(document, "s_index.static_factor"));
    let max_raw = lookup(document, "s_index.max_factor");

    let base = base_raw.map(to_f64);
    let max = max_raw.map(to_f64);
    let (base, max) = if matches!(base, Some(None)) || matches!(max, Some(None)) {
        (None, None)
    } else {
        (base.flatten(), max.flatten())
    };

    if let Some(b) = base
        && b <= 0.0
    {
        report.error("s_index.base_factor", "Base factor must be greater than 0.");
    }
    if let Some(m) = max
        && m <= 0.0
    {
        report.error("s_index.max_factor", "Max factor must be greater than 0.");
    }
    if let (Some(b), Some(m)) = (base, max)
        && m < b
    {
        report.error("s_index.max_factor", "Max factor must be >= base factor.");
    }
}

fn check_learning(document: &Value, report: &mut DocumentReport) {
    let Some(learning) = document.get("learning").and_then(Value::as_object) else {
        return;
    };

    if let Some(samples) = learning.get("min_sample_threshold") {
        match to_i64(samples) {
            Some(v) if v < 0 => report.error(
                "learning.min_sample_threshold",
                "Value must be zero or positive.",
            ),
            Some(_) => {}
            None => report.error("learning.min_sample_threshold", "Value must be an integer."),
        }
    }
    if let Some(improvement) = learning.get("min_improvement_threshold") {
        match to_f64(improvement) {
            Some(v) if v < 0.0 => report.error(
                "learning.min_improvement_threshold",
                "Value must be zero or positive.",
            ),
            Some(_) => {}
            None => report.error(
                "learning.min_improvement_threshold",
                "Value must be a number.",
            ),
        }
    }
}

/// Hardware toggles that contradict their sizing parameters
fn check_toggles(document: &Value, report: &mut DocumentReport) {
    let zero = |dotted: &str| {
        lookup(document, dotted)
            .and_then(to_f64)
            .is_some_and(|v| v == 0.0)
    };

    // A zero capacity is already rejected by the battery checks
    if is_enabled(document, "system.has_battery")
        && lookup(document, "battery.capacity_kwh").is_none()
    {
        report.error(
            "battery.capacity_kwh",
            "Battery capacity is required when a battery is installed.",
        );
    }
    if is_enabled(document, "system.has_water_heater") && zero("water_heating.power_kw") {
        report.warn(
            "Water heater is enabled but its power is 0 kW.",
            "Set water_heating.power_kw to the heater's rated power, or disable the water heater.",
        );
    }
    if is_enabled(document, "system.has_solar") && zero("system.solar_array.kwp") {
        report.warn(
            "Solar is enabled but the array size is 0 kWp.",
            "Set system.solar_array.kwp to the installed peak power, or disable solar.",
        );
    }
}

/// Fill price-feed settings that must survive any merge
pub fn ensure_critical_defaults(document: &mut Value) {
    let Some(root) = document.as_object_mut() else {
        return;
    };
    let nordpool = root
        .entry("nordpool")
        .or_insert_with(|| Value::Object(Map::new()));
    if !nordpool.is_object() {
        *nordpool = Value::Object(Map::new());
    }
    if let Some(section) = nordpool.as_object_mut() {
        section
            .entry("resolution_minutes")
            .or_insert_with(|| json!(15));
        section.entry("price_area").or_insert_with(|| json!("SE4"));
        section.entry("currency").or_insert_with(|| json!("SEK"));
    }
}

/// Copy of the document with credentials removed
pub fn strip_secrets(document: &Value) -> Value {
    let mut public = document.clone();
    for (section, key) in SECRET_PATHS {
        if let Some(object) = public.get_mut(*section).and_then(Value::as_object_mut) {
            object.remove(*key);
        }
    }
    public
}
