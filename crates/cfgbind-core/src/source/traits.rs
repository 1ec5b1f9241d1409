//! Source trait definition

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::types::{CancellationToken, ValueMap};

/// Notification that a source's data may have changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub timestamp: DateTime<Utc>,
    /// Short description, carried into the snapshot trigger
    pub cause: String,
}

impl ChangeEvent {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            cause: cause.into(),
        }
    }
}

/// Source data together with each key's spelling inside the source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedData {
    pub values: ValueMap,
    /// Key in `values` → original key, e.g. `db.url` → `APP_DB_URL`
    pub original_keys: HashMap<String, String>,
}

impl From<ValueMap> for KeyedData {
    fn from(values: ValueMap) -> Self {
        Self {
            values,
            original_keys: HashMap::new(),
        }
    }
}

/// A provider of key-value configuration data
///
/// Sources are merged in registration order; later sources win per key.
///
/// Implementations:
/// - `MemorySource`: in-memory data with manual change notification
/// - Environment, file and remote sources live with the application
#[async_trait]
pub trait Source: Send + Sync {
    /// Name used in provenance labels and errors
    fn name(&self) -> &str;

    /// Load the current data
    async fn load(&self, cancel: &CancellationToken) -> SourceResult<ValueMap>;

    /// Load the current data along with original key spellings
    async fn load_with_keys(&self, cancel: &CancellationToken) -> SourceResult<KeyedData> {
        Ok(KeyedData::from(self.load(cancel).await?))
    }

    /// Subscribe to change notifications
    ///
    /// The channel closes when the source stops watching.
    async fn watch(&self, _cancel: &CancellationToken) -> SourceResult<mpsc::Receiver<ChangeEvent>> {
        Err(SourceError::WatchNotSupported)
    }
}

/// Errors that can occur while reading a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Source does not support watching")]
    WatchNotSupported,

    #[error("Source not available: {0}")]
    NotAvailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Source error: {0}")]
    Other(String),
}

pub type SourceResult<T> = Result<T, SourceError>;
