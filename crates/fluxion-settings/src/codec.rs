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

//! Conversion between form strings and typed document values

use fluxion_settings_types::{Field, FieldType};
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Outcome of parsing one form string
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// Typed value to write
    Value(Value),
    /// Empty numeric input, leave the stored value unchanged
    Unset,
    /// Not representable in the field's type
    Invalid,
}

impl Parsed {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Unset | Self::Invalid => None,
        }
    }
}

/// Parse a form string into the value the field stores
pub fn parse(field: &Field, raw: &str) -> Parsed {
    let trimmed = raw.trim();

    match field.field_type {
        FieldType::Number | FieldType::Azimuth | FieldType::Tilt => {
            if trimmed.is_empty() {
                Parsed::Unset
            } else {
                parse_number(trimmed).map_or(Parsed::Invalid, Parsed::Value)
            }
        }
        FieldType::Boolean => match trimmed {
            "true" => Parsed::Value(Value::Bool(true)),
            "false" => Parsed::Value(Value::Bool(false)),
            _ => Parsed::Invalid,
        },
        FieldType::Array => Parsed::Value(Value::Array(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| parse_number(token).unwrap_or_else(|| Value::String(token.to_owned())))
                .collect(),
        )),
        FieldType::Select => {
            let chosen = field
                .options
                .iter()
                .find(|option| format_value(&option.value) == trimmed);
            Parsed::Value(chosen.map_or_else(
                || Value::String(trimmed.to_owned()),
                |option| option.value.clone(),
            ))
        }
        FieldType::Text | FieldType::Entity | FieldType::Service => {
            Parsed::Value(Value::String(trimmed.to_owned()))
        }
    }
}

/// Parse a finite number, keeping integers integral
pub fn parse_number(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::from(int));
    }
    let float = raw.parse::<f64>().ok().filter(|f| f.is_finite())?;
    Number::from_f64(float).map(Value::Number)
}

/// Numeric view of a form string or stored value
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s).and_then(|v| v.as_f64()),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Render a stored value for editing
///
/// Booleans always render as `true`/`false`; a missing value renders empty.
pub fn format(field: &Field, value: Option<&Value>) -> String {
    if field.field_type == FieldType::Boolean {
        let on = match value {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim() == "true",
            Some(Value::Null | Value::Number(_) | Value::Array(_) | Value::Object(_)) | None => {
                false
            }
        };
        return on.to_string();
    }
    value.map(format_value).unwrap_or_default()
}

/// Type-independent rendering used for options and arrays
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

fn format_number(n: &Number) -> String {
    if let Some(int) = n.as_i64() {
        int.to_string()
    } else if let Some(uint) = n.as_u64() {
        uint.to_string()
    } else {
        // f64 Display is the shortest round-tripping form and never uses exponents
        n.as_f64().map(|f| f.to_string()).unwrap_or_default()
    }
}

/// Value equality where numbers compare numerically (`10 == 10.0`)
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b) == Some(Ordering::Equal),
        _ => x == y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxion_settings_types::SelectOption;
    use serde_json::json;

    fn field(field_type: FieldType) -> Field {
        Field::new("section.value", "Value", field_type)
    }

    #[test]
    fn test_parse_number() {
        let f = field(FieldType::Number);
        assert_eq!(parse(&f, "10"), Parsed::Value(json!(10)));
        assert_eq!(parse(&f, " 12.5 "), Parsed::Value(json!(12.5)));
        assert_eq!(parse(&f, "-3"), Parsed::Value(json!(-3)));
        assert_eq!(parse(&f, ""), Parsed::Unset);
        assert_eq!(parse(&f, "   "), Parsed::Unset);
        assert_eq!(parse(&f, "abc"), Parsed::Invalid);
        assert_eq!(parse(&f, "inf"), Parsed::Invalid);
        assert_eq!(parse(&f, "NaN"), Parsed::Invalid);
    }

    #[test]
    fn test_parse_boolean_is_strict() {
        let f = field(FieldType::Boolean);
        assert_eq!(parse(&f, "true"), Parsed::Value(json!(true)));
        assert_eq!(parse(&f, " false"), Parsed::Value(json!(false)));
        assert_eq!(parse(&f, "yes"), Parsed::Invalid);
        assert_eq!(parse(&f, ""), Parsed::Invalid);
    }

    #[test]
    fn test_parse_array_mixed_tokens() {
        let f = field(FieldType::Array);
        assert_eq!(
            parse(&f, "1, 2.5, ,sensor.a"),
            Parsed::Value(json!([1, 2.5, "sensor.a"]))
        );
        assert_eq!(parse(&f, ""), Parsed::Value(json!([])));
    }

    #[test]
    fn test_parse_select_keeps_option_type() {
        let f = field(FieldType::Select).with_options(vec![
            SelectOption::new(15, "15 min"),
            SelectOption::new(60, "60 min"),
        ]);
        assert_eq!(parse(&f, "15"), Parsed::Value(json!(15)));
        assert_eq!(parse(&f, " custom "), Parsed::Value(json!("custom")));
    }

    #[test]
    fn test_parse_text_trims() {
        let f = field(FieldType::Entity);
        assert_eq!(
            parse(&f, "  sensor.battery_soc "),
            Parsed::Value(json!("sensor.battery_soc"))
        );
    }

    #[test]
    fn test_format() {
        assert_eq!(format(&field(FieldType::Number), Some(&json!(10))), "10");
        assert_eq!(format(&field(FieldType::Number), Some(&json!(10.0))), "10");
        assert_eq!(format(&field(FieldType::Number), Some(&json!(12.5))), "12.5");
        assert_eq!(format(&field(FieldType::Number), None), "");
        assert_eq!(format(&field(FieldType::Text), Some(&Value::Null)), "");
        assert_eq!(format(&field(FieldType::Array), Some(&json!([1, "a"]))), "1, a");
        assert_eq!(format(&field(FieldType::Boolean), None), "false");
        assert_eq!(format(&field(FieldType::Boolean), Some(&json!("true"))), "true");
        assert_eq!(format(&field(FieldType::Boolean), Some(&json!(1))), "false");
    }

    #[test]
    fn test_canonical_round_trip() {
        let cases = [
            (FieldType::Number, "10"),
            (FieldType::Number, "0.25"),
            (FieldType::Boolean, "false"),
            (FieldType::Array, "1, 2, x"),
            (FieldType::Text, "Europe/Stockholm"),
        ];
        for (field_type, raw) in cases {
            let f = field(field_type);
            let value = parse(&f, raw).into_value().unwrap();
            assert_eq!(format(&f, Some(&value)), raw, "{field_type}");
        }
    }

    #[test]
    fn test_values_equal_numeric() {
        assert!(values_equal(&json!(10), &json!(10.0)));
        assert!(values_equal(&json!([1, 2.0]), &json!([1.0, 2])));
        assert!(!values_equal(&json!([1, 2]), &json!([1, 2, 3])));
        assert!(!values_equal(&json!(10), &json!("10")));
    }
}
