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

//! Field schema model
//!
//! A [`Schema`] is an immutable catalog of [`Field`] descriptors. Each field points
//! at exactly one leaf of the configuration document through its `path` and tells
//! the engine how to edit it (type, options, visibility predicates, validation hints).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Editable value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free numeric input
    Number,
    /// Free text
    Text,
    /// On/off toggle
    Boolean,
    /// Home Assistant entity id (e.g. `sensor.battery_soc`)
    Entity,
    /// Home Assistant service (e.g. `notify.mobile_app`)
    Service,
    /// One of a fixed set of options
    Select,
    /// Comma separated list of numbers and/or strings
    Array,
    /// Compass direction in degrees (0-360)
    Azimuth,
    /// Panel tilt in degrees (0-90)
    Tilt,
}

impl FieldType {
    /// Whether values of this type are edited as numbers
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Azimuth | Self::Tilt)
    }

    /// Config string value (lowercase)
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Entity => "entity",
            Self::Service => "service",
            Self::Select => "select",
            Self::Array => "array",
            Self::Azimuth => "azimuth",
            Self::Tilt => "tilt",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One choice of a `select` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Typed value written to the document when chosen
    pub value: Value,
    /// Human readable label
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

fn default_show_value() -> Value {
    Value::Bool(true)
}

/// Show a field only while another field holds a given value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowIf {
    /// Key of the controlling field
    pub config_key: String,
    /// Expected value, `true` unless stated otherwise
    #[serde(default = "default_show_value")]
    pub value: Value,
    /// Hint shown while the field is hidden
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_text: Option<String>,
}

/// Schema entry describing how one configuration leaf is edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Unique id, also the form state key
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helper: Option<String>,
    /// Object keys from the document root down to the leaf
    pub path: Vec<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    /// Field rendered next to this one (e.g. an "inverted" flag)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion_key: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Read-only: never validated, never patched
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<ShowIf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub show_if_all: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub show_if_any: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsection: Option<String>,
}

impl Field {
    /// Create a field whose path is the dotted key split into segments
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        let key = key.into();
        let path = key.split('.').map(str::to_owned).collect();
        Self {
            key,
            label: label.into(),
            helper: None,
            path,
            field_type,
            options: Vec::new(),
            companion_key: None,
            required: false,
            disabled: false,
            show_if: None,
            show_if_all: Vec::new(),
            show_if_any: Vec::new(),
            disabled_text: None,
            subsection: None,
        }
    }

    /// Point the field at an explicit document path
    #[must_use]
    pub fn with_path(mut self, path: &[&str]) -> Self {
        self.path = path.iter().map(|s| (*s).to_owned()).collect();
        self
    }

    #[must_use]
    pub fn with_helper(mut self, helper: impl Into<String>) -> Self {
        self.helper = Some(helper.into());
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_companion(mut self, key: impl Into<String>) -> Self {
        self.companion_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_subsection(mut self, subsection: impl Into<String>) -> Self {
        self.subsection = Some(subsection.into());
        self
    }

    #[must_use]
    pub fn with_disabled_text(mut self, text: impl Into<String>) -> Self {
        self.disabled_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Visible only while `config_key` holds `value`
    #[must_use]
    pub fn show_when(mut self, config_key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.show_if = Some(ShowIf {
            config_key: config_key.into(),
            value: value.into(),
            disabled_text: None,
        });
        self
    }

    /// Visible only while every listed field is truthy
    #[must_use]
    pub fn show_when_all(mut self, keys: &[&str]) -> Self {
        self.show_if_all = keys.iter().map(|k| (*k).to_owned()).collect();
        self
    }

    /// Visible while at least one listed field is truthy
    #[must_use]
    pub fn show_when_any(mut self, keys: &[&str]) -> Self {
        self.show_if_any = keys.iter().map(|k| (*k).to_owned()).collect();
        self
    }

    pub fn is_numeric(&self) -> bool {
        self.field_type.is_numeric()
    }

    /// Last dotted segment of the key, used for naming conventions
    pub fn key_leaf(&self) -> &str {
        self.key.rsplit('.').next().unwrap_or(&self.key)
    }

    /// Keys of other fields this field's visibility depends on
    pub fn visibility_refs(&self) -> impl Iterator<Item = &str> {
        self.show_if
            .iter()
            .map(|s| s.config_key.as_str())
            .chain(self.show_if_all.iter().map(String::as_str))
            .chain(self.show_if_any.iter().map(String::as_str))
    }
}

/// Relational rule between two numeric fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relation {
    /// `lower` must be strictly less than `upper`
    LessThan { lower: String, upper: String },
}

impl Relation {
    pub fn less_than(lower: impl Into<String>, upper: impl Into<String>) -> Self {
        Self::LessThan {
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn keys(&self) -> [&str; 2] {
        match self {
            Self::LessThan { lower, upper } => [lower, upper],
        }
    }

    pub fn involves(&self, key: &str) -> bool {
        self.keys().contains(&key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("duplicate field key: {0}")]
    DuplicateKey(String),

    #[error("field {0} has an empty path")]
    EmptyPath(String),

    #[error("field {key} overlaps the path of field {other}")]
    OverlappingPath { key: String, other: String },

    #[error("select field {0} declares no options")]
    MissingOptions(String),

    #[error("field {key} references unknown field {reference}")]
    UnknownReference { key: String, reference: String },
}

/// Immutable, validated field catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    relations: Vec<Relation>,
}

impl Schema {
    /// Build a schema, checking that keys are unique and every path names one leaf
    pub fn new(fields: Vec<Field>) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(fields.len());

        for (position, field) in fields.iter().enumerate() {
            if field.path.is_empty() || field.path.iter().any(String::is_empty) {
                return Err(SchemaError::EmptyPath(field.key.clone()));
            }
            if field.field_type == FieldType::Select && field.options.is_empty() {
                return Err(SchemaError::MissingOptions(field.key.clone()));
            }
            if index.insert(field.key.clone(), position).is_some() {
                return Err(SchemaError::DuplicateKey(field.key.clone()));
            }
        }

        // A path that is a prefix of another would make one of them a non-leaf
        for (i, field) in fields.iter().enumerate() {
            for other in fields.iter().skip(i + 1) {
                if field.path.starts_with(&other.path) || other.path.starts_with(&field.path) {
                    return Err(SchemaError::OverlappingPath {
                        key: field.key.clone(),
                        other: other.key.clone(),
                    });
                }
            }
        }

        Ok(Self {
            fields,
            index,
            relations: Vec::new(),
        })
    }

    /// Concatenate several schemas (e.g. settings tabs sharing one save)
    pub fn combine(parts: impl IntoIterator<Item = Schema>) -> Result<Self, SchemaError> {
        let mut fields = Vec::new();
        let mut relations = Vec::new();
        for part in parts {
            fields.extend(part.fields);
            relations.extend(part.relations);
        }
        let mut schema = Self::new(fields)?;
        schema.relations = relations;
        Ok(schema)
    }

    /// Attach cross-field relations; both sides must be fields of this schema
    pub fn with_relations(mut self, relations: Vec<Relation>) -> Result<Self, SchemaError> {
        for relation in &relations {
            let keys = relation.keys();
            if let Some(missing) = keys.iter().find(|k| !self.contains(k)) {
                return Err(SchemaError::UnknownReference {
                    key: keys[0].to_owned(),
                    reference: (*missing).to_owned(),
                });
            }
        }
        self.relations.extend(relations);
        Ok(self)
    }

    /// Check that companion and visibility references resolve inside this schema
    ///
    /// Not part of [`Schema::new`] because a single tab may legitimately refer to a
    /// toggle living on another tab.
    pub fn check_references(&self) -> Result<(), SchemaError> {
        for field in &self.fields {
            let refs = field.visibility_refs().chain(field.companion_key.as_deref());
            for reference in refs {
                if !self.contains(reference) {
                    return Err(SchemaError::UnknownReference {
                        key: field.key.clone(),
                        reference: reference.to_owned(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.index.get(key).and_then(|&i| self.fields.get(i))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn relations_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Relation> {
        self.relations.iter().filter(move |r| r.involves(key))
    }

    /// Fields whose visibility depends on `key`
    pub fn dependents_of<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Field> {
        self.fields
            .iter()
            .filter(move |f| f.visibility_refs().any(|r| r == key))
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
