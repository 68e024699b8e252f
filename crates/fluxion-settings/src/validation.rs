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

//! Field validation
//!
//! Intrinsic checks (required, numeric, range by naming convention) run per field.
//! Cross-field rules come from the schema's [`Relation`] list and always update both
//! sides, so fixing either field clears the pair.

use crate::codec;
use crate::form::FormState;
use crate::visibility::is_active;
use fluxion_settings_types::{Field, FieldIssue, FieldType, Relation, Schema};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::debug;

pub const REQUIRED: &str = "Required";
pub const NOT_A_NUMBER: &str = "Must be a number";

/// Current error per field key; any entry blocks saving
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn has_errors(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.0.insert(key.into(), message.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set or clear entries as the update dictates
    pub fn apply(&mut self, update: ValidationUpdate) {
        for (key, message) in update.0 {
            match message {
                Some(message) => {
                    self.0.insert(key, message);
                }
                None => {
                    self.0.remove(&key);
                }
            }
        }
    }

    /// Record issues reported by the store
    pub fn extend_issues(&mut self, issues: &[FieldIssue]) {
        for issue in issues {
            self.insert(issue.field.clone(), issue.message.clone());
        }
    }
}

/// Per-key outcome of a validation pass, `None` clears the key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationUpdate(BTreeMap<String, Option<String>>);

impl ValidationUpdate {
    pub fn set(&mut self, key: impl Into<String>, message: Option<String>) {
        self.0.insert(key.into(), message);
    }

    /// `Some(None)` when the key is cleared, `None` when the update leaves it alone
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.0.get(key).map(Option::as_deref)
    }

    /// Error the update assigns to `key`, if any
    pub fn error(&self, key: &str) -> Option<&str> {
        self.get(key).flatten()
    }

    pub fn merge(&mut self, other: ValidationUpdate) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validate `key` as if it held `value`, plus every relation it takes part in
pub fn validate_field(
    schema: &Schema,
    key: &str,
    value: &str,
    form: &FormState,
) -> ValidationUpdate {
    let mut update = ValidationUpdate::default();
    let Some(field) = schema.field(key) else {
        return update;
    };

    let form = if form.get(key) == Some(value) {
        Cow::Borrowed(form)
    } else {
        let mut edited = form.clone();
        edited.set(key, value);
        Cow::Owned(edited)
    };

    update.set(key, intrinsic_error(field, &form));
    for relation in schema.relations_for(key) {
        check_relation(schema, relation, &form, &mut update);
    }
    update
}

/// Validate every field of the schema against the form
pub fn validate_form(schema: &Schema, form: &FormState) -> FieldErrors {
    let mut update = ValidationUpdate::default();
    for field in schema {
        update.set(field.key.clone(), intrinsic_error(field, form));
    }
    for relation in schema.relations() {
        check_relation(schema, relation, form, &mut update);
    }

    let mut errors = FieldErrors::default();
    errors.apply(update);
    errors
}

/// Required, numeric and range checks for an active field
fn intrinsic_error(field: &Field, form: &FormState) -> Option<String> {
    if !is_active(field, form) {
        return None;
    }
    check_value(field, form.value(&field.key))
}

/// Check a raw value without regard to visibility
pub fn check_value(field: &Field, raw: &str) -> Option<String> {
    if field.field_type == FieldType::Boolean {
        return None;
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return is_required(field).then(|| REQUIRED.to_owned());
    }

    if !field.is_numeric() {
        return None;
    }

    let Some(number) = codec::parse_number(trimmed).and_then(|v| v.as_f64()) else {
        return Some(NOT_A_NUMBER.to_owned());
    };
    range_error(field, number)
}

/// Explicit flag, or a leaf named like a power or capacity figure
pub fn is_required(field: &Field) -> bool {
    let leaf = field.key_leaf();
    field.required || leaf.ends_with("power_kw") || leaf.ends_with("capacity_kwh")
}

fn range_error(field: &Field, number: f64) -> Option<String> {
    if field.field_type == FieldType::Azimuth {
        return (!(0.0..=360.0).contains(&number)).then(|| "Must be between 0 and 360".to_owned());
    }
    if field.field_type == FieldType::Tilt {
        return (!(0.0..=90.0).contains(&number)).then(|| "Must be between 0 and 90".to_owned());
    }

    let tokens: Vec<&str> = field.key_leaf().split('_').collect();
    let has = |token: &str| tokens.contains(&token);

    if has("percent") || has("soc") {
        (!(0.0..=100.0).contains(&number)).then(|| "Must be between 0 and 100".to_owned())
    } else if has("capacity") && has("kwh") {
        (number <= 0.0).then(|| "Must be greater than 0".to_owned())
    } else if has("kw") || has("kwh") || has("sek") {
        (number < 0.0).then(|| "Must be zero or positive".to_owned())
    } else {
        None
    }
}

/// Recompute both sides of a relation
///
/// An intrinsic error on either side takes precedence; the relation is only
/// judged when both sides are active and well-formed numbers.
fn check_relation(
    schema: &Schema,
    relation: &Relation,
    form: &FormState,
    update: &mut ValidationUpdate,
) {
    let Relation::LessThan { lower, upper } = relation;
    let (Some(lower_field), Some(upper_field)) = (schema.field(lower), schema.field(upper)) else {
        return;
    };

    let lower_error = intrinsic_error(lower_field, form);
    let upper_error = intrinsic_error(upper_field, form);
    let lower_raw = form.value(lower).trim();
    let upper_raw = form.value(upper).trim();

    let violated = lower_error.is_none()
        && upper_error.is_none()
        && is_active(lower_field, form)
        && is_active(upper_field, form)
        && match (
            codec::parse_number(lower_raw).and_then(|v| v.as_f64()),
            codec::parse_number(upper_raw).and_then(|v| v.as_f64()),
        ) {
            (Some(low), Some(high)) => low >= high,
            _ => false,
        };

    if violated {
        debug!("Relation violated: {} ({}) >= {} ({})", lower, lower_raw, upper, upper_raw);
        update.set(
            lower.clone(),
            Some(format!("Must be less than {} ({upper_raw})", upper_field.label)),
        );
        update.set(
            upper.clone(),
            Some(format!("Must be greater than {} ({lower_raw})", lower_field.label)),
        );
    } else {
        update.set(lower.clone(), lower_error);
        update.set(upper.clone(), upper_error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battery_schema() -> Schema {
        Schema::new(vec![
            Field::new("battery.capacity_kwh", "Capacity (kWh)", FieldType::Number),
            Field::new("battery.min_soc_percent", "Min SoC (%)", FieldType::Number),
            Field::new("battery.max_soc_percent", "Max SoC (%)", FieldType::Number),
            Field::new("battery.max_charge_power_kw", "Max charge (kW)", FieldType::Number),
            Field::new("battery_economics.battery_cycle_cost_kwh", "Cycle cost", FieldType::Number),
            Field::new("system.solar_array.azimuth", "Azimuth", FieldType::Azimuth),
            Field::new("system.solar_array.tilt", "Tilt", FieldType::Tilt),
            Field::new("system.timezone", "Timezone", FieldType::Text).required(),
            Field::new("system.has_battery", "Battery", FieldType::Boolean),
        ])
        .unwrap()
        .with_relations(vec![Relation::less_than(
            "battery.min_soc_percent",
            "battery.max_soc_percent",
        )])
        .unwrap()
    }

    fn form(pairs: &[(&str, &str)]) -> FormState {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_required_by_convention() {
        let schema = battery_schema();
        let update = validate_field(&schema, "battery.capacity_kwh", " ", &form(&[]));
        assert_eq!(update.error("battery.capacity_kwh"), Some(REQUIRED));

        let update = validate_field(&schema, "battery.max_charge_power_kw", "", &form(&[]));
        assert_eq!(update.error("battery.max_charge_power_kw"), Some(REQUIRED));

        let update = validate_field(&schema, "system.timezone", "", &form(&[]));
        assert_eq!(update.error("system.timezone"), Some(REQUIRED));

        // Optional numeric left empty is fine
        let update = validate_field(&schema, "system.solar_array.azimuth", "", &form(&[]));
        assert_eq!(update.get("system.solar_array.azimuth"), Some(None));
    }

    #[test]
    fn test_numeric_checks() {
        let schema = battery_schema();
        let check = |key: &str, value: &str| {
            validate_field(&schema, key, value, &form(&[]))
                .error(key)
                .map(str::to_owned)
        };

        assert_eq!(check("battery.capacity_kwh", "abc").as_deref(), Some(NOT_A_NUMBER));
        assert_eq!(
            check("battery.capacity_kwh", "0").as_deref(),
            Some("Must be greater than 0")
        );
        assert_eq!(
            check("battery.min_soc_percent", "101").as_deref(),
            Some("Must be between 0 and 100")
        );
        assert_eq!(
            check("battery.max_charge_power_kw", "-1").as_deref(),
            Some("Must be zero or positive")
        );
        assert_eq!(
            check("battery_economics.battery_cycle_cost_kwh", "-0.5").as_deref(),
            Some("Must be zero or positive")
        );
        assert_eq!(
            check("system.solar_array.azimuth", "400").as_deref(),
            Some("Must be between 0 and 360")
        );
        assert_eq!(
            check("system.solar_array.tilt", "95").as_deref(),
            Some("Must be between 0 and 90")
        );
        assert_eq!(check("system.solar_array.tilt", "35"), None);
    }

    #[test]
    fn test_booleans_never_required() {
        let schema = battery_schema();
        let update = validate_field(&schema, "system.has_battery", "", &form(&[]));
        assert_eq!(update.get("system.has_battery"), Some(None));
    }

    #[test]
    fn test_relation_marks_both_fields() {
        let schema = battery_schema();
        let state = form(&[
            ("battery.min_soc_percent", "10"),
            ("battery.max_soc_percent", "95"),
        ]);

        let update = validate_field(&schema, "battery.min_soc_percent", "96", &state);
        assert_eq!(
            update.error("battery.min_soc_percent"),
            Some("Must be less than Max SoC (%) (95)")
        );
        assert_eq!(
            update.error("battery.max_soc_percent"),
            Some("Must be greater than Min SoC (%) (96)")
        );

        let mut errors = FieldErrors::default();
        errors.apply(update);
        assert_eq!(errors.len(), 2);

        // Fixing the other side clears both
        let state = form(&[
            ("battery.min_soc_percent", "96"),
            ("battery.max_soc_percent", "95"),
        ]);
        errors.apply(validate_field(&schema, "battery.max_soc_percent", "98", &state));
        assert!(!errors.has_errors());
    }

    #[test]
    fn test_relation_keeps_partner_intrinsic_error() {
        let schema = battery_schema();
        let state = form(&[
            ("battery.min_soc_percent", "10"),
            ("battery.max_soc_percent", "150"),
        ]);
        let update = validate_field(&schema, "battery.min_soc_percent", "20", &state);
        assert_eq!(update.get("battery.min_soc_percent"), Some(None));
        assert_eq!(
            update.error("battery.max_soc_percent"),
            Some("Must be between 0 and 100")
        );
    }

    #[test]
    fn test_hidden_field_is_cleared() {
        let schema = Schema::new(vec![
            Field::new("system.has_water_heater", "Water heater", FieldType::Boolean),
            Field::new("water_heating.power_kw", "Power", FieldType::Number)
                .show_when("system.has_water_heater", true),
        ])
        .unwrap();
        let state = form(&[("system.has_water_heater", "false")]);
        let update = validate_field(&schema, "water_heating.power_kw", "", &state);
        assert_eq!(update.get("water_heating.power_kw"), Some(None));

        let state = form(&[("system.has_water_heater", "true")]);
        let update = validate_field(&schema, "water_heating.power_kw", "", &state);
        assert_eq!(update.error("water_heating.power_kw"), Some(REQUIRED));
    }

    #[test]
    fn test_validate_form() {
        let schema = battery_schema();
        let state = form(&[
            ("battery.capacity_kwh", "27"),
            ("battery.min_soc_percent", "90"),
            ("battery.max_soc_percent", "20"),
            ("battery.max_charge_power_kw", "10"),
            ("system.timezone", "Europe/Stockholm"),
            ("system.has_battery", "true"),
        ]);
        let errors = validate_form(&schema, &state);
        assert!(errors.has_errors());
        assert!(errors.get("battery.min_soc_percent").is_some());
        assert!(errors.get("battery.max_soc_percent").is_some());
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let update = validate_field(&battery_schema(), "nope", "1", &form(&[]));
        assert!(update.is_empty());
    }
}
