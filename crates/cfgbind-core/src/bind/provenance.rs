//! Per-field provenance records

use serde::Serialize;

/// Where one bound leaf got its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvenanceRecord {
    /// Declared-name path, e.g. `Database.Url`
    pub field_path: String,
    /// Normalized key the value was read from, e.g. `db.url`
    pub key_path: String,
    /// Source label, qualified with the source's original key when known
    /// (`env:APP_DB_URL`), or `default`
    pub source_label: String,
    pub secret: bool,
}

/// Provenance of every assigned leaf of one bound instance, in declaration order
///
/// Returned next to the instance rather than stored globally; detach it with
/// [`crate::Loaded::take_provenance`] or [`crate::Loaded::into_parts`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Provenance {
    records: Vec<ProvenanceRecord>,
}

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ProvenanceRecord) {
        self.records.push(record);
    }

    /// Record for a field path
    pub fn get(&self, field_path: &str) -> Option<&ProvenanceRecord> {
        self.records.iter().find(|r| r.field_path == field_path)
    }

    /// Source label for a field path
    pub fn source_of(&self, field_path: &str) -> Option<&str> {
        self.get(field_path).map(|r| r.source_label.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProvenanceRecord> {
        self.records.iter()
    }

    /// Records of fields marked `secret`
    pub fn secrets(&self) -> impl Iterator<Item = &ProvenanceRecord> {
        self.records.iter().filter(|r| r.secret)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<ProvenanceRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Provenance {
    type Item = &'a ProvenanceRecord;
    type IntoIter = std::slice::Iter<'a, ProvenanceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
