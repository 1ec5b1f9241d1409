//! One-shot load pipeline
//!
//! merge → bind → strict audit → directive validation → custom validators.
//! Every failure after the merge lands in one aggregated error; a failed
//! load never hands out an instance.

use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use crate::audit::{audit_keys, KeySpace};
use crate::bind::{bind, Provenance};
use crate::logging::{SharedLogger, TracingLogger};
use crate::schema::{Schema, Settings};
use crate::source::{merge, MergedData, Source};
use crate::types::CancellationToken;
use crate::validate::{validate_tree, ErrorKind, FieldErrors, Validator};
use crate::{log_debug, log_info};
use super::error::{LoadError, LoadResult};

/// Quiet period after the last change notification before a reload
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Buffer size of the snapshot and error channels
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// A bound, validated configuration with the provenance of its fields
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    config: T,
    provenance: Provenance,
}

impl<T> Loaded<T> {
    pub fn config(&self) -> &T {
        &self.config
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Detach the provenance, leaving an empty one behind
    pub fn take_provenance(&mut self) -> Provenance {
        std::mem::take(&mut self.provenance)
    }

    pub fn into_inner(self) -> T {
        self.config
    }

    pub fn into_parts(self) -> (T, Provenance) {
        (self.config, self.provenance)
    }
}

impl<T> Deref for Loaded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.config
    }
}

/// Loads a [`Settings`] type from layered sources
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use cfgbind_core::schema::{Fields, Settings};
/// use cfgbind_core::{CancellationToken, Loader, MemorySource};
///
/// #[derive(Debug, Default)]
/// struct Server {
///     host: String,
///     port: u16,
/// }
///
/// impl Settings for Server {
///     fn describe(f: &mut Fields<Self>) {
///         f.field("Host", "required", |s| &s.host, |s| &mut s.host)
///             .field("Port", "default:8080", |s| &s.port, |s| &mut s.port);
///     }
/// }
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let source = Arc::new(MemorySource::new("memory").with_value("host", "example.com"));
/// let loaded = Loader::<Server>::new()
///     .with_source(source)
///     .load(&CancellationToken::new())
///     .await
///     .unwrap();
///
/// assert_eq!(loaded.host, "example.com");
/// assert_eq!(loaded.provenance().source_of("Port"), Some("default"));
/// # });
/// ```
pub struct Loader<T: Settings> {
    pub(crate) schema: Arc<Schema<T>>,
    key_space: Arc<KeySpace>,
    pub(crate) sources: Vec<Arc<dyn Source>>,
    validators: Vec<Arc<dyn Validator<T>>>,
    strict: bool,
    pub(crate) debounce: Duration,
    pub(crate) channel_capacity: usize,
    pub(crate) logger: SharedLogger,
}

impl<T: Settings> Clone for Loader<T> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            key_space: Arc::clone(&self.key_space),
            sources: self.sources.clone(),
            validators: self.validators.clone(),
            strict: self.strict,
            debounce: self.debounce,
            channel_capacity: self.channel_capacity,
            logger: Arc::clone(&self.logger),
        }
    }
}

impl<T: Settings> Default for Loader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Settings> Loader<T> {
    /// Create a loader with no sources
    pub fn new() -> Self {
        let schema = Schema::<T>::of();
        let key_space = KeySpace::of(&schema, "");
        Self {
            schema: Arc::new(schema),
            key_space: Arc::new(key_space),
            sources: Vec::new(),
            validators: Vec::new(),
            strict: false,
            debounce: DEFAULT_DEBOUNCE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            logger: Arc::new(TracingLogger::new()),
        }
    }

    /// Add a source; later sources override earlier ones per key
    pub fn with_source(mut self, source: Arc<dyn Source>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_sources(mut self, sources: impl IntoIterator<Item = Arc<dyn Source>>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Reject merged keys that no field consumes
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Add a custom validator; validators run in registration order
    pub fn with_validator(mut self, validator: impl Validator<T> + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn schema(&self) -> &Schema<T> {
        &self.schema
    }

    pub fn sources(&self) -> &[Arc<dyn Source>] {
        &self.sources
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Merge all sources and bind the result
    pub async fn load(&self, cancel: &CancellationToken) -> LoadResult<Loaded<T>> {
        let merged = merge(&self.sources, cancel).await?;
        log_debug!(
            self.logger,
            "merged {} keys from {} sources",
            merged.len(),
            self.sources.len()
        );
        self.bind_merged(&merged, cancel)
    }

    /// Run everything after the merge against already-merged data
    pub fn bind_merged(&self, merged: &MergedData, cancel: &CancellationToken) -> LoadResult<Loaded<T>> {
        let mut config = T::default();
        let outcome = bind(&mut config, &self.schema, merged, "", "");
        let mut errors = outcome.errors;

        let unknown = audit_keys(&self.key_space, merged);
        if self.strict {
            errors.extend(unknown);
        } else if !unknown.is_empty() {
            let keys: Vec<&str> = unknown.iter().map(|e| e.field_path.as_str()).collect();
            log_debug!(self.logger, "ignoring unknown keys: {}", keys.join(", "));
        }

        // A field that failed coercion holds its zero value; skip its constraints
        let mistyped: HashSet<String> = errors
            .iter()
            .filter(|e| e.kind == ErrorKind::InvalidType)
            .map(|e| e.field_path.clone())
            .collect();
        errors.extend(
            validate_tree(&self.schema, &config)
                .into_iter()
                .filter(|e| !mistyped.contains(&e.field_path)),
        );

        for validator in &self.validators {
            if cancel.is_cancelled() {
                return Err(LoadError::Cancelled);
            }
            if let Err(failure) = validator.validate(cancel, &config) {
                errors.extend(failure.into_field_errors());
            }
        }

        if !errors.is_empty() {
            return Err(LoadError::Invalid(FieldErrors::from(errors)));
        }

        log_info!(
            self.logger,
            "configuration bound: {} fields from {} keys",
            outcome.provenance.len(),
            merged.len()
        );
        Ok(Loaded {
            config,
            provenance: outcome.provenance,
        })
    }
}
