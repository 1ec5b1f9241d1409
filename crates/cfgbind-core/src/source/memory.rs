//! In-memory configuration source

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use crate::types::{CancellationToken, Value, ValueMap};
use super::traits::{ChangeEvent, KeyedData, Source, SourceError, SourceResult};

const WATCH_BUFFER: usize = 16;

/// In-memory source for tests and embedding
///
/// Data is changed with [`MemorySource::set`] or [`MemorySource::insert`];
/// watchers only hear about it through [`MemorySource::notify`].
#[derive(Debug)]
pub struct MemorySource {
    name: String,
    values: RwLock<ValueMap>,
    original_keys: RwLock<HashMap<String, String>>,
    failure: RwLock<Option<String>>,
    watchers: Mutex<Vec<mpsc::UnboundedSender<ChangeEvent>>>,
    watchable: bool,
}

impl MemorySource {
    /// Create an empty memory source
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: RwLock::new(ValueMap::new()),
            original_keys: RwLock::new(HashMap::new()),
            failure: RwLock::new(None),
            watchers: Mutex::new(Vec::new()),
            watchable: true,
        }
    }

    /// Create a memory source holding the entries of a JSON object
    pub fn from_json(name: impl Into<String>, json: serde_json::Value) -> Self {
        let source = Self::new(name);
        if let Value::Map(values) = Value::from(json) {
            source.set(values);
        }
        source
    }

    pub fn with_value(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Record how `key` is spelled in the backing store
    pub fn with_original_key(self, key: impl Into<String>, original: impl Into<String>) -> Self {
        self.original_keys.write().insert(key.into(), original.into());
        self
    }

    /// Refuse watch subscriptions
    pub fn without_watch(mut self) -> Self {
        self.watchable = false;
        self
    }

    /// Replace all data
    pub fn set(&self, values: ValueMap) {
        *self.values.write() = values;
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values.write().remove(key)
    }

    /// Make every following load fail with [`SourceError::NotAvailable`]
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write() = Some(message.into());
    }

    pub fn clear_failure(&self) {
        *self.failure.write() = None;
    }

    /// Send a change notification to every live watcher
    ///
    /// Events queue up while a watcher's channel is full; closed watchers
    /// are dropped.
    pub fn notify(&self, cause: impl Into<String>) {
        let event = ChangeEvent::new(cause);
        self.watchers.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live watch subscriptions
    pub fn watcher_count(&self) -> usize {
        self.watchers.lock().iter().filter(|tx| !tx.is_closed()).count()
    }
}

#[async_trait]
impl Source for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self, cancel: &CancellationToken) -> SourceResult<ValueMap> {
        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled);
        }
        if let Some(message) = self.failure.read().clone() {
            return Err(SourceError::NotAvailable(message));
        }
        Ok(self.values.read().clone())
    }

    async fn load_with_keys(&self, cancel: &CancellationToken) -> SourceResult<KeyedData> {
        let values = self.load(cancel).await?;
        Ok(KeyedData {
            values,
            original_keys: self.original_keys.read().clone(),
        })
    }

    async fn watch(&self, _cancel: &CancellationToken) -> SourceResult<mpsc::Receiver<ChangeEvent>> {
        if !self.watchable {
            return Err(SourceError::WatchNotSupported);
        }
        let (tx, rx) = mpsc::channel(WATCH_BUFFER);
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        self.watchers.lock().push(queue_tx);
        tokio::spawn(forward(queue_rx, tx));
        Ok(rx)
    }
}

/// Move queued events into the watcher's channel until either side closes
async fn forward(mut queue: mpsc::UnboundedReceiver<ChangeEvent>, tx: mpsc::Sender<ChangeEvent>) {
    loop {
        tokio::select! {
            _ = tx.closed() => break,
            event = queue.recv() => match event {
                Some(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }
}
