//! Configuration sources and the merge coordinator

mod traits;
mod merge;
mod memory;

pub use traits::{ChangeEvent, KeyedData, Source, SourceError, SourceResult};
pub use merge::{merge, Entry, MergedData};
pub use memory::MemorySource;
