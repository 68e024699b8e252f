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

//! Deep access into nested JSON documents
//!
//! Segments address object keys, or array elements when the node is an array and
//! the segment is a decimal index. Writers create missing intermediate objects and
//! replace any scalar (or non-addressable array) standing in the way by an object.

use serde_json::{Map, Value};

/// Read the value at `path`, `None` if any segment is missing
pub fn get<'a, S: AsRef<str>>(doc: &'a Value, path: &[S]) -> Option<&'a Value> {
    path.iter().try_fold(doc, |node, segment| {
        let segment = segment.as_ref();
        match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => None,
        }
    })
}

/// Return a copy of `doc` with `value` written at `path`
#[must_use]
pub fn set<S: AsRef<str>>(doc: &Value, path: &[S], value: Value) -> Value {
    let mut copy = doc.clone();
    set_in_place(&mut copy, path, value);
    copy
}

/// Write `value` at `path`, creating intermediate objects
pub fn set_in_place<S: AsRef<str>>(doc: &mut Value, path: &[S], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *doc = value;
        return;
    };
    set_in_place(slot(doc, head.as_ref()), rest, value);
}

fn slot<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    let index = match &*node {
        Value::Array(items) => segment.parse::<usize>().ok().filter(|i| *i < items.len()),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Object(_) => {
            None
        }
    };

    match (node, index) {
        (Value::Array(items), Some(i)) => &mut items[i],
        (Value::Object(map), _) => map.entry(segment.to_owned()).or_insert(Value::Null),
        (other, _) => {
            *other = Value::Object(Map::new());
            slot(other, segment)
        }
    }
}

/// Merge two JSON values recursively
/// `target` is modified in place with values from `source`; objects recurse,
/// everything else is replaced
pub fn merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_obj), Value::Object(source_obj)) => {
            for (k, v) in source_obj {
                merge(target_obj.entry(k).or_insert(Value::Null), v);
            }
        }
        (target_val, source_val) => {
            *target_val = source_val;
        }
    }
}
