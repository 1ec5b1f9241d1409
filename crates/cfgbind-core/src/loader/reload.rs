//! Live reload
//!
//! [`Loader::watch`] performs the initial load, then keeps one task that
//! waits for change notifications from every watchable source, debounces
//! them and reruns the pipeline. Each successful run is published as a new
//! [`Snapshot`]; failed runs are reported on a separate channel and leave the
//! current snapshot in place.

use std::ops::Deref;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Instant};
use tokio_stream::wrappers::ReceiverStream;

use crate::bind::Provenance;
use crate::schema::Settings;
use crate::source::{ChangeEvent, SourceError};
use crate::types::CancellationToken;
use crate::{log_debug, log_error, log_info, log_warn};
use super::error::{LoadError, LoadResult};
use super::pipeline::{Loaded, Loader};

/// Trigger recorded on the first snapshot
pub const INITIAL_TRIGGER: &str = "initial";

/// Lifecycle of a watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Initial load in progress
    Initializing,
    Steady,
    Reloading,
    Closed,
}

/// An adopted configuration version
#[derive(Debug)]
pub struct Snapshot<T> {
    pub config: Arc<T>,
    pub provenance: Arc<Provenance>,
    /// 1 for the initial load, incremented on every successful reload
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
    /// Cause of the change notification that produced this snapshot
    pub trigger: String,
}

impl<T> Snapshot<T> {
    fn new(loaded: Loaded<T>, version: u64, trigger: impl Into<String>) -> Self {
        let (config, provenance) = loaded.into_parts();
        Self {
            config: Arc::new(config),
            provenance: Arc::new(provenance),
            version,
            loaded_at: Utc::now(),
            trigger: trigger.into(),
        }
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            provenance: Arc::clone(&self.provenance),
            version: self.version,
            loaded_at: self.loaded_at,
            trigger: self.trigger.clone(),
        }
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.config
    }
}

/// A reload that did not produce a new snapshot
#[derive(Debug, thiserror::Error)]
#[error("Reload triggered by '{trigger}' failed: {error}")]
pub struct ReloadError {
    pub trigger: String,
    /// Version that stays current
    pub kept_version: u64,
    pub occurred_at: DateTime<Utc>,
    #[source]
    pub error: LoadError,
}

/// Handle on a running watch
///
/// Both channels close once the watch stops, either through cancellation
/// or because this handle was dropped. Each channel holds up to the
/// loader's channel capacity of unread items; further snapshots are only
/// visible through [`Watch::current`] and further errors are dropped, and
/// reloading continues either way.
pub struct Watch<T> {
    snapshots: mpsc::Receiver<Snapshot<T>>,
    errors: mpsc::Receiver<ReloadError>,
    current: watch::Receiver<Snapshot<T>>,
    state: watch::Receiver<WatchState>,
}

impl<T> Watch<T> {
    /// Next published snapshot; `None` once the watch has closed
    pub async fn next_snapshot(&mut self) -> Option<Snapshot<T>> {
        self.snapshots.recv().await
    }

    /// Next failed reload; `None` once the watch has closed
    pub async fn next_error(&mut self) -> Option<ReloadError> {
        self.errors.recv().await
    }

    /// Latest adopted snapshot
    pub fn current(&self) -> Snapshot<T> {
        self.current.borrow().clone()
    }

    pub fn state(&self) -> WatchState {
        *self.state.borrow()
    }

    /// Wait until the watch has closed
    pub async fn closed(&mut self) {
        // Err means the task is gone, which only happens after closing
        let _ = self.state.wait_for(|state| *state == WatchState::Closed).await;
    }
}

impl<T: Settings> Loader<T> {
    /// Load once, then keep reloading on change notifications until `cancel`
    ///
    /// Sources that cannot be watched are still loaded on every reload. An
    /// initial load failure is returned directly and nothing keeps running.
    pub async fn watch(&self, cancel: CancellationToken) -> LoadResult<Watch<T>> {
        // Subscribe first so changes made during the initial load are not lost
        let mut streams = Vec::new();
        for source in &self.sources {
            match source.watch(&cancel).await {
                Ok(rx) => streams.push(ReceiverStream::new(rx)),
                Err(SourceError::WatchNotSupported) => {
                    log_debug!(self.logger, "source '{}' cannot be watched, skipping", source.name());
                }
                Err(error) => {
                    log_warn!(self.logger, "failed to watch source '{}': {}", source.name(), error);
                }
            }
        }

        let initial = Snapshot::new(self.load(&cancel).await?, 1, INITIAL_TRIGGER);
        log_info!(
            self.logger,
            "watching {} of {} sources, version 1 loaded",
            streams.len(),
            self.sources.len()
        );

        let (snapshot_tx, snapshot_rx) = mpsc::channel(self.channel_capacity);
        let (error_tx, error_rx) = mpsc::channel(self.channel_capacity);
        let (current_tx, current_rx) = watch::channel(initial.clone());
        let (state_tx, state_rx) = watch::channel(WatchState::Steady);

        // Capacity is at least one and the channel is fresh
        let _ = snapshot_tx.try_send(initial);

        let task = ReloadTask {
            loader: self.clone(),
            cancel,
            snapshots: snapshot_tx,
            errors: error_tx,
            current: current_tx,
            state: state_tx,
            version: 1,
        };
        tokio::spawn(task.run(streams));

        Ok(Watch {
            snapshots: snapshot_rx,
            errors: error_rx,
            current: current_rx,
            state: state_rx,
        })
    }
}

struct ReloadTask<T: Settings> {
    loader: Loader<T>,
    cancel: CancellationToken,
    snapshots: mpsc::Sender<Snapshot<T>>,
    errors: mpsc::Sender<ReloadError>,
    current: watch::Sender<Snapshot<T>>,
    state: watch::Sender<WatchState>,
    version: u64,
}

impl<T: Settings> ReloadTask<T> {
    async fn run(mut self, streams: Vec<ReceiverStream<ChangeEvent>>) {
        let mut changes = stream::select_all(streams);
        let mut watching = !changes.is_empty();
        let mut pending: Option<String> = None;

        let debounce = sleep(self.loader.debounce);
        tokio::pin!(debounce);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    log_debug!(self.loader.logger, "watch cancelled");
                    break;
                }
                _ = self.snapshots.closed() => {
                    log_debug!(self.loader.logger, "snapshot receiver dropped");
                    break;
                }
                event = changes.next(), if watching => match event {
                    Some(event) => {
                        log_debug!(self.loader.logger, "change notification: {}", event.cause);
                        pending = Some(event.cause);
                        debounce.as_mut().reset(Instant::now() + self.loader.debounce);
                    }
                    None => {
                        log_debug!(self.loader.logger, "all watched sources stopped");
                        watching = false;
                    }
                },
                _ = &mut debounce, if pending.is_some() => {
                    if let Some(cause) = pending.take() {
                        if !self.reload(cause).await {
                            break;
                        }
                    }
                }
            }
        }

        self.state.send_replace(WatchState::Closed);
        log_info!(self.loader.logger, "watch closed at version {}", self.version);
    }

    /// Rerun the pipeline; `false` when the watch should stop
    async fn reload(&mut self, cause: String) -> bool {
        self.state.send_replace(WatchState::Reloading);
        log_info!(self.loader.logger, "reloading configuration ({})", cause);

        match self.loader.load(&self.cancel).await {
            Ok(loaded) => {
                self.version += 1;
                let snapshot = Snapshot::new(loaded, self.version, cause);
                self.current.send_replace(snapshot.clone());
                self.state.send_replace(WatchState::Steady);
                log_info!(self.loader.logger, "configuration reloaded, version {}", self.version);

                match self.snapshots.try_send(snapshot) {
                    Ok(()) => true,
                    Err(TrySendError::Full(snapshot)) => {
                        log_warn!(
                            self.loader.logger,
                            "snapshot stream full, version {} only published as current",
                            snapshot.version
                        );
                        true
                    }
                    Err(TrySendError::Closed(_)) => false,
                }
            }
            Err(LoadError::Cancelled) => false,
            Err(error) => {
                self.state.send_replace(WatchState::Steady);
                log_error!(
                    self.loader.logger,
                    "reload failed, keeping version {}: {}",
                    self.version,
                    error
                );
                let failure = ReloadError {
                    trigger: cause,
                    kept_version: self.version,
                    occurred_at: Utc::now(),
                    error,
                };
                // A full or dropped error receiver does not stop snapshots
                if let Err(TrySendError::Full(failure)) = self.errors.try_send(failure) {
                    log_debug!(
                        self.loader.logger,
                        "error stream full, dropping report for '{}'",
                        failure.trigger
                    );
                }
                true
            }
        }
    }
}
