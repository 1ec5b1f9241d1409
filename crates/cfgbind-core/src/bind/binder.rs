//! Structural binder
//!
//! Walks a schema in declaration order, looks every field up in the merged
//! data, coerces it and assigns it through the field's accessor. Coercion
//! failures become `invalid_type` errors without stopping the walk.
//! Required-ness is left to the validation engine.

use crate::coerce::coerce;
use crate::schema::{FieldKind, Schema};
use crate::source::MergedData;
use crate::types::Value;
use crate::validate::{ErrorKind, FieldError};
use super::provenance::{Provenance, ProvenanceRecord};

/// Source label recorded for values taken from a `default:` directive
pub const DEFAULT_SOURCE: &str = "default";

/// Result of binding merged data into a target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindOutcome {
    /// `invalid_type` errors, in declaration order
    pub errors: Vec<FieldError>,
    pub provenance: Provenance,
}

/// Bind merged data into `target`
///
/// `key_prefix` is prepended to derived key paths and `field_prefix` to
/// field paths, so a schema can be bound below an arbitrary section.
pub fn bind<T>(
    target: &mut T,
    schema: &Schema<T>,
    merged: &MergedData,
    key_prefix: &str,
    field_prefix: &str,
) -> BindOutcome {
    let mut binder = Binder::new(merged);
    binder.bind_fields(schema, target, key_prefix, field_prefix);
    binder.finish()
}

/// State of one bind walk
pub(crate) struct Binder<'a> {
    merged: &'a MergedData,
    errors: Vec<FieldError>,
    provenance: Provenance,
}

impl<'a> Binder<'a> {
    pub(crate) fn new(merged: &'a MergedData) -> Self {
        Self {
            merged,
            errors: Vec::new(),
            provenance: Provenance::new(),
        }
    }

    pub(crate) fn finish(self) -> BindOutcome {
        BindOutcome {
            errors: self.errors,
            provenance: self.provenance,
        }
    }

    /// Whether any merged data lives at or below `key_path`
    pub(crate) fn has_data_at(&self, key_path: &str) -> bool {
        self.merged.has_data_at(key_path)
    }

    pub(crate) fn bind_fields<T>(
        &mut self,
        schema: &Schema<T>,
        target: &mut T,
        key_prefix: &str,
        field_prefix: &str,
    ) {
        for field in schema.fields() {
            let key_path = field.key_path(key_prefix);
            let field_path = field.field_path(field_prefix);

            match field.kind() {
                FieldKind::Group(slot) => {
                    // Nested maps at key_path are resolved by the merged data lookup
                    slot.bind(self, target, &key_path, &field_path);
                }
                FieldKind::Leaf(slot) => {
                    let directives = field.directives();
                    let (raw, source_label) = match self.merged.resolve(&key_path) {
                        Some((value, entry)) => (value.clone(), entry.label()),
                        None => match &directives.default {
                            Some(literal) => (Value::Text(literal.clone()), DEFAULT_SOURCE.to_string()),
                            None => continue,
                        },
                    };

                    let typed = match coerce(&raw, slot.shape()) {
                        Ok(typed) => typed,
                        Err(err) => {
                            let err = if directives.secret { err.redacted() } else { err };
                            let message = if source_label == DEFAULT_SOURCE {
                                format!("default {}", err)
                            } else {
                                err.to_string()
                            };
                            self.errors.push(FieldError::new(field_path, ErrorKind::InvalidType, message));
                            continue;
                        }
                    };

                    if !slot.write(target, typed) {
                        self.errors.push(FieldError::new(
                            field_path,
                            ErrorKind::InvalidType,
                            format!("value does not fit field of shape {}", slot.shape()),
                        ));
                        continue;
                    }

                    self.provenance.push(ProvenanceRecord {
                        field_path,
                        key_path,
                        source_label,
                        secret: directives.secret,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{merged, AppConfig, Tls};
    use crate::source::MergedData;
    use serde_json::json;
    use std::time::Duration;

    fn bind_app(data: &MergedData) -> (AppConfig, BindOutcome) {
        let schema = Schema::<AppConfig>::of();
        let mut config = AppConfig::default();
        let outcome = bind(&mut config, &schema, data, "", "");
        (config, outcome)
    }

    #[test]
    fn test_binds_flat_keys() {
        let data = merged("memory", json!({
            "host": "example.com",
            "port": "9000",
            "timeout": "5s",
            "tags": "a,b",
        }));
        let (config, outcome) = bind_app(&data);

        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        assert_eq!(config.host, "example.com");
        assert_eq!(config.port, 9000);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_defaults_recorded_with_default_label() {
        let data = merged("memory", json!({ "host": "h" }));
        let (config, outcome) = bind_app(&data);

        assert_eq!(config.port, 8080);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(outcome.provenance.source_of("Port"), Some(DEFAULT_SOURCE));
        assert_eq!(outcome.provenance.source_of("Host"), Some("memory"));
    }

    #[test]
    fn test_absent_without_default_left_zero() {
        let data = MergedData::new();
        let (config, outcome) = bind_app(&data);

        assert!(outcome.errors.is_empty());
        assert_eq!(config.host, "");
        assert!(outcome.provenance.get("Host").is_none());
        assert!(outcome.provenance.get("Env").is_none());
    }

    #[test]
    fn test_coercion_failure_continues_walk() {
        let data = merged("memory", json!({ "port": "eighty", "timeout": "soon", "host": "h" }));
        let (config, outcome) = bind_app(&data);

        let paths: Vec<&str> = outcome.errors.iter().map(|e| e.field_path.as_str()).collect();
        assert_eq!(paths, vec!["Port", "Timeout"]);
        assert!(outcome.errors.iter().all(|e| e.kind == ErrorKind::InvalidType));
        assert!(outcome.errors[0].message.contains("\"eighty\""));
        assert!(outcome.errors[0].message.contains("u16"));
        assert_eq!(config.host, "h");
    }

    #[test]
    fn test_secret_value_not_echoed() {
        let data = merged("memory", json!({ "tls.cert": "c", "tls.key": ["hunter2"] }));
        let (_, outcome) = bind_app(&data);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].field_path, "Tls.Key");
        assert!(outcome.errors[0].message.contains("<redacted>"));
        assert!(!outcome.errors[0].message.contains("hunter2"));
    }

    #[test]
    fn test_group_over_flat_keys_with_prefix() {
        let data = merged("memory", json!({ "db.url": "postgres://db", "db.pool": 4 }));
        let (config, outcome) = bind_app(&data);

        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        assert_eq!(config.database.url, "postgres://db");
        assert_eq!(config.database.pool, 4);
        let record = outcome.provenance.get("Database.Url").unwrap();
        assert_eq!(record.key_path, "db.url");
    }

    #[test]
    fn test_group_over_nested_map() {
        let data = merged("file", json!({ "db": { "url": "postgres://nested", "password": "pw" } }));
        let (config, outcome) = bind_app(&data);

        assert_eq!(config.database.url, "postgres://nested");
        assert_eq!(config.database.password, "pw");
        let record = outcome.provenance.get("Database.Password").unwrap();
        assert_eq!(record.key_path, "db.password");
        assert!(record.secret);
        assert_eq!(record.source_label, "file");
    }

    #[test]
    fn test_explicit_name_key() {
        let data = merged("memory", json!({ "http.listen": "0.0.0.0:80" }));
        let (config, outcome) = bind_app(&data);
        assert_eq!(config.listen, "0.0.0.0:80");
        assert_eq!(outcome.provenance.get("Listen").unwrap().key_path, "http.listen");
    }

    #[test]
    fn test_optional_leaf_null_is_absent() {
        let data = merged("memory", json!({ "maxconns": null }));
        let (config, outcome) = bind_app(&data);
        assert!(outcome.errors.is_empty());
        assert_eq!(config.max_conns, None);

        let data = merged("memory", json!({ "maxconns": "12" }));
        let (config, _) = bind_app(&data);
        assert_eq!(config.max_conns, Some(12));
    }

    #[test]
    fn test_optional_group_materialized_only_with_data() {
        let (config, _) = bind_app(&MergedData::new());
        assert!(config.tls.is_none());

        let data = merged("memory", json!({ "tls.cert": "/etc/cert.pem" }));
        let (config, _) = bind_app(&data);
        assert_eq!(
            config.tls,
            Some(Tls { cert: "/etc/cert.pem".to_string(), key: String::new() })
        );
    }

    #[test]
    fn test_key_and_field_prefix() {
        let data = merged("memory", json!({ "app.host": "prefixed" }));
        let schema = Schema::<AppConfig>::of();
        let mut config = AppConfig::default();
        let outcome = bind(&mut config, &schema, &data, "app", "App");

        assert_eq!(config.host, "prefixed");
        let record = outcome.provenance.get("App.Host").unwrap();
        assert_eq!(record.key_path, "app.host");
    }

    #[test]
    fn test_malformed_default_reported() {
        use crate::schema::{Fields, Settings};

        #[derive(Debug, Default)]
        struct BadDefault {
            retries: u8,
        }

        impl Settings for BadDefault {
            fn describe(f: &mut Fields<Self>) {
                f.field("Retries", "default:many", |c| &c.retries, |c| &mut c.retries);
            }
        }

        let schema = Schema::<BadDefault>::of();
        let mut target = BadDefault::default();
        let outcome = bind(&mut target, &schema, &MergedData::new(), "", "");
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.starts_with("default cannot convert"));
        assert_eq!(target.retries, 0);
    }

    #[test]
    fn test_idempotent() {
        let data = merged("memory", json!({
            "host": "h", "port": 2000, "db": { "url": "u" }, "tags": ["x"],
        }));
        let (first, first_outcome) = bind_app(&data);
        let (second, second_outcome) = bind_app(&data);
        assert_eq!(first, second);
        assert_eq!(first_outcome, second_outcome);
    }

    #[test]
    fn test_list_value_for_text_list() {
        let mut data = MergedData::new();
        data.insert("memory", "tags", Value::from(vec!["a", "b"]), None);
        let (config, _) = bind_app(&data);
        assert_eq!(config.tags, vec!["a".to_string(), "b".to_string()]);
    }
}
