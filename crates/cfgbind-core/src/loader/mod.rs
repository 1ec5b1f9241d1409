//! Load pipeline and live reload

mod error;
mod pipeline;
mod reload;

pub use error::{LoadError, LoadResult};
pub use pipeline::{Loaded, Loader, DEFAULT_CHANNEL_CAPACITY, DEFAULT_DEBOUNCE};
pub use reload::{ReloadError, Snapshot, Watch, WatchState, INITIAL_TRIGGER};
