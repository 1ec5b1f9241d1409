//! Key-space auditing
//!
//! Computes the set of keys a schema can consume and reports merged keys
//! outside it. Used by strict mode; non-strict loads drop unknown keys.

use std::collections::BTreeSet;

use crate::coerce::coerce;
use crate::schema::{join_path, FieldKind, Schema, Settings};
use crate::source::MergedData;
use crate::types::Value;
use crate::validate::{ErrorKind, FieldError, FieldErrors};

/// Every key path a schema consumes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySpace {
    /// Leaf and group key paths
    pub keys: BTreeSet<String>,
    /// Key paths whose map values are audited entry by entry: groups and
    /// every dotted prefix of a consumed key
    pub groups: BTreeSet<String>,
}

impl KeySpace {
    /// Key space of a schema mounted under `prefix`
    pub fn of<T>(schema: &Schema<T>, prefix: &str) -> Self {
        let mut space = Self::default();
        collect_fields(schema, prefix, &mut space);
        space
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn is_group(&self, key: &str) -> bool {
        self.groups.contains(key)
    }
}

/// Every legitimate key path of a schema, including each group's own path
pub fn collect_valid_keys<T>(schema: &Schema<T>, prefix: &str) -> BTreeSet<String> {
    KeySpace::of(schema, prefix).keys
}

pub(crate) fn collect_fields<T>(schema: &Schema<T>, prefix: &str, space: &mut KeySpace) {
    for field in schema.fields() {
        let key_path = field.key_path(prefix);
        // The binder also finds `a.b` inside a map under `a`
        for (dot, _) in key_path.match_indices('.') {
            space.groups.insert(key_path[..dot].to_string());
        }
        match field.kind() {
            FieldKind::Leaf(_) => {
                space.keys.insert(key_path);
            }
            FieldKind::Group(slot) => {
                space.keys.insert(key_path.clone());
                space.groups.insert(key_path.clone());
                slot.collect_keys(&key_path, space);
            }
        }
    }
}

/// One `unknown_key` error per merged key outside the key space, sorted by key
pub fn audit_keys(space: &KeySpace, merged: &MergedData) -> Vec<FieldError> {
    let mut out = Vec::new();
    for (key, entry) in merged.iter() {
        audit_key(space, key, &entry.value, &mut out);
    }
    out.sort_by(|a, b| a.field_path.cmp(&b.field_path));
    out
}

fn audit_key(space: &KeySpace, key: &str, value: &Value, out: &mut Vec<FieldError>) {
    match value {
        Value::Map(children) if space.is_group(key) => {
            for (child, child_value) in children {
                audit_key(space, &join_path(key, child), child_value, out);
            }
        }
        _ if space.contains(key) => {}
        _ => out.push(FieldError::new(
            key,
            ErrorKind::UnknownKey,
            format!("unknown configuration key {:?}", key),
        )),
    }
}

/// Coerce every `default:` literal of `T` without loading anything
///
/// Defaults are otherwise only coerced when a load needs them, so a
/// malformed literal surfaces on the first load that lacks the key.
pub fn audit_defaults<T: Settings>() -> Result<(), FieldErrors> {
    let mut out = Vec::new();
    check_default_fields(&Schema::<T>::of(), "", &mut out);
    FieldErrors::from(out).into_result()
}

pub(crate) fn check_default_fields<T>(schema: &Schema<T>, field_prefix: &str, out: &mut Vec<FieldError>) {
    for field in schema.fields() {
        let field_path = field.field_path(field_prefix);
        match field.kind() {
            FieldKind::Leaf(slot) => {
                let Some(literal) = &field.directives().default else {
                    continue;
                };
                if let Err(err) = coerce(&Value::Text(literal.clone()), slot.shape()) {
                    out.push(FieldError::new(field_path, ErrorKind::InvalidType, format!("default {}", err)));
                }
            }
            FieldKind::Group(slot) => slot.check_defaults(&field_path, out),
        }
    }
}
