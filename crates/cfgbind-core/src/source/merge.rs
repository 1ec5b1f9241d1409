//! Merging source data into one attributed key space

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::loader::{LoadError, LoadResult};
use crate::types::{CancellationToken, Value, ValueMap};
use super::traits::{KeyedData, Source, SourceError};

/// A merged value and the source it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub value: Value,
    /// Name of the source that supplied the value
    pub source: String,
    /// Key as spelled inside the source, when the source reports it
    pub original_key: Option<String>,
    /// Position of the supplying source in the merge order
    pub layer: usize,
}

impl Entry {
    /// Provenance label: `source:original_key` or just `source`
    pub fn label(&self) -> String {
        match &self.original_key {
            Some(original) => format!("{}:{}", self.source, original),
            None => self.source.clone(),
        }
    }
}

/// Lowercased key → attributed value, after all sources are layered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedData {
    entries: BTreeMap<String, Entry>,
    layers: usize,
}

impl MergedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer one source's data on top; existing keys are overwritten
    pub fn layer(&mut self, source: &str, data: KeyedData) {
        let KeyedData { values, original_keys } = data;
        for (key, value) in values {
            let original = original_keys.get(&key).cloned();
            self.insert(source, &key, value, original);
        }
        self.layers += 1;
    }

    /// Insert one value into the current layer, lowercasing the key and
    /// every nested map key
    pub fn insert(&mut self, source: &str, key: &str, value: Value, original_key: Option<String>) {
        self.entries.insert(
            key.to_lowercase(),
            Entry {
                value: value.normalized(),
                source: source.to_string(),
                original_key,
                layer: self.layers,
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value at a dotted key path
    ///
    /// The key may be spelled flat or inside the map of any key prefix. When
    /// several spellings hold a value the one from the latest layer wins;
    /// within a layer the exact key beats the longest prefix. A nested value
    /// is attributed to its prefix's entry.
    pub fn resolve(&self, key_path: &str) -> Option<(&Value, &Entry)> {
        let mut found = self.entries.get(key_path).map(|entry| (&entry.value, entry));
        for (dot, _) in key_path.rmatch_indices('.') {
            let Some(entry) = self.entries.get(&key_path[..dot]) else {
                continue;
            };
            if found.is_some_and(|(_, best)| best.layer >= entry.layer) {
                continue;
            }
            if let Value::Map(map) = &entry.value {
                if let Some(value) = lookup_nested(map, &key_path[dot + 1..]) {
                    found = Some((value, entry));
                }
            }
        }
        found
    }

    /// Whether non-null data exists at or below a key path
    pub fn has_data_at(&self, key_path: &str) -> bool {
        if matches!(self.resolve(key_path), Some((value, _)) if !value.is_null()) {
            return true;
        }
        let below = format!("{}.", key_path);
        self.entries
            .range(below.clone()..)
            .take_while(|(key, _)| key.starts_with(&below))
            .any(|(_, entry)| !entry.value.is_null())
    }
}

fn lookup_nested<'a>(map: &'a ValueMap, path: &str) -> Option<&'a Value> {
    if let Some(value) = map.get(path) {
        return Some(value);
    }
    for (dot, _) in path.rmatch_indices('.') {
        if let Some(Value::Map(inner)) = map.get(&path[..dot]) {
            if let Some(value) = lookup_nested(inner, &path[dot + 1..]) {
                return Some(value);
            }
        }
    }
    None
}

/// Load every source in order and merge the results
///
/// A failing source aborts the merge; nothing partial is returned.
pub async fn merge(sources: &[Arc<dyn Source>], cancel: &CancellationToken) -> LoadResult<MergedData> {
    let mut merged = MergedData::new();
    for source in sources {
        if cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }
        let data = source.load_with_keys(cancel).await.map_err(|error| match error {
            SourceError::Cancelled => LoadError::Cancelled,
            error => LoadError::Source {
                name: source.name().to_string(),
                error,
            },
        })?;
        if cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }
        merged.layer(source.name(), data);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::merged;
    use crate::source::MemorySource;
    use serde_json::json;

    #[test]
    fn test_keys_lowercased() {
        let data = merged("env", json!({ "DB.URL": "u", "Db": { "Pool": 3 } }));
        assert!(data.get("db.url").is_some());
        let (value, _) = data.resolve("db.pool").unwrap();
        assert_eq!(value, &Value::Int(3));
    }

    #[test]
    fn test_resolve_exact_before_nested_in_same_layer() {
        let mut data = MergedData::new();
        data.insert("file", "db", Value::from(json!({ "url": "nested" })), None);
        data.insert("env", "db.url", Value::from("flat"), Some("APP_DB_URL".into()));

        let (value, entry) = data.resolve("db.url").unwrap();
        assert_eq!(value, &Value::from("flat"));
        assert_eq!(entry.label(), "env:APP_DB_URL");
    }

    #[test]
    fn test_resolve_deeply_nested() {
        let data = merged("file", json!({ "a": { "b": { "c": 1 } }, "x.y": { "z": 2 } }));
        assert_eq!(data.resolve("a.b.c").map(|(v, _)| v), Some(&Value::Int(1)));
        assert_eq!(data.resolve("x.y.z").map(|(v, _)| v), Some(&Value::Int(2)));
        assert!(data.resolve("a.b.d").is_none());
        assert!(data.resolve("a.c").is_none());
    }

    #[test]
    fn test_has_data_at() {
        let data = merged("memory", json!({ "tls.cert": "c", "cache": { "size": 1 }, "gone": null }));
        assert!(data.has_data_at("tls"));
        assert!(data.has_data_at("cache"));
        assert!(data.has_data_at("cache.size"));
        assert!(!data.has_data_at("gone"));
        assert!(!data.has_data_at("tl"));
        assert!(!data.has_data_at("db"));
    }

    #[test]
    fn test_entry_label() {
        let plain = Entry { value: Value::Null, source: "file".into(), original_key: None, layer: 0 };
        assert_eq!(plain.label(), "file");
    }

    #[tokio::test]
    async fn test_later_source_wins() {
        let first = MemorySource::new("file")
            .with_value("port", 8080)
            .with_value("host", "a");
        let second = MemorySource::new("env")
            .with_value("PORT", 9090)
            .with_original_key("PORT", "APP_PORT");
        let sources: Vec<Arc<dyn Source>> = vec![Arc::new(first), Arc::new(second)];

        let data = merge(&sources, &CancellationToken::new()).await.unwrap();
        let port = data.get("port").unwrap();
        assert_eq!(port.value, Value::Int(9090));
        assert_eq!(port.label(), "env:APP_PORT");
        assert_eq!(data.get("host").unwrap().source, "file");
    }

    #[tokio::test]
    async fn test_later_source_wins_across_spellings() {
        let flat = || -> Arc<dyn Source> {
            Arc::new(MemorySource::new("env").with_value("db.url", "flat"))
        };
        let nested = || -> Arc<dyn Source> {
            Arc::new(MemorySource::from_json("file", json!({ "db": { "url": "nested" } })))
        };
        let token = CancellationToken::new();

        let data = merge(&[flat(), nested()], &token).await.unwrap();
        let (value, entry) = data.resolve("db.url").unwrap();
        assert_eq!(value, &Value::from("nested"));
        assert_eq!(entry.source, "file");
        assert_eq!(entry.layer, 1);

        let data = merge(&[nested(), flat()], &token).await.unwrap();
        let (value, entry) = data.resolve("db.url").unwrap();
        assert_eq!(value, &Value::from("flat"));
        assert_eq!(entry.source, "env");
    }

    #[tokio::test]
    async fn test_later_shallower_prefix_wins() {
        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(MemorySource::from_json("file", json!({ "a.b": { "c": 1 } }))),
            Arc::new(MemorySource::from_json("env", json!({ "a": { "b": { "c": 2 } } }))),
        ];
        let data = merge(&sources, &CancellationToken::new()).await.unwrap();
        let (value, entry) = data.resolve("a.b.c").unwrap();
        assert_eq!(value, &Value::Int(2));
        assert_eq!(entry.source, "env");
    }

    #[tokio::test]
    async fn test_failing_source_aborts() {
        let ok = MemorySource::new("file").with_value("host", "a");
        let broken = MemorySource::new("remote");
        broken.fail_with("connection refused");
        let sources: Vec<Arc<dyn Source>> = vec![Arc::new(ok), Arc::new(broken)];

        let err = merge(&sources, &CancellationToken::new()).await.unwrap_err();
        match err {
            LoadError::Source { name, error } => {
                assert_eq!(name, "remote");
                assert!(error.to_string().contains("connection refused"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_load() {
        let token = CancellationToken::new();
        token.cancel();
        let sources: Vec<Arc<dyn Source>> = vec![Arc::new(MemorySource::new("file"))];
        assert!(matches!(merge(&sources, &token).await, Err(LoadError::Cancelled)));
    }
}
