//! cfgbind Core
//!
//! Binds layered key-value sources into typed, validated configuration.
//! Each bound field carries provenance, and the configuration can be
//! reloaded live as sources change.
//!
//! ## Pipeline
//!
//! - Sources are loaded in order and merged; later sources win per key
//! - Merged values are coerced into the declared field types
//! - Directives (`required`, `min`, `max`, `oneof`, ...) are checked
//! - Custom validators run last; every failure is aggregated
//!
//! ```rust,ignore
//! use cfgbind_core::{CancellationToken, Loader, MemorySource};
//!
//! let loader = Loader::<AppConfig>::new()
//!     .with_source(file_source)
//!     .with_source(env_source)
//!     .strict(true);
//!
//! let loaded = loader.load(&CancellationToken::new()).await?;
//! println!("port {} from {:?}", loaded.port, loaded.provenance().source_of("Port"));
//!
//! // Reload whenever a watchable source reports a change
//! let mut watch = loader.watch(cancel.clone()).await?;
//! while let Some(snapshot) = watch.next_snapshot().await {
//!     apply(&snapshot.config, snapshot.version);
//! }
//! ```

pub mod types;
pub mod directive;
pub mod coerce;
pub mod schema;
pub mod bind;
pub mod validate;
pub mod audit;
pub mod source;
pub mod loader;
pub mod logging;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use types::{Value, ValueMap, Shape, Typed, CancellationToken};

pub use schema::{Fields, Leaf, Schema, Settings};

pub use bind::{Provenance, ProvenanceRecord};

pub use validate::{ErrorKind, FieldError, FieldErrors, ValidationFailure, Validator};

pub use audit::{audit_defaults, collect_valid_keys};

pub use source::{ChangeEvent, MemorySource, MergedData, Source, SourceError, SourceResult};

pub use loader::{
    LoadError, LoadResult, Loaded, Loader,
    ReloadError, Snapshot, Watch, WatchState,
};

pub use logging::{Logger, NoOpLogger, SharedLogger, TracingLogger};
