//! Logging abstractions
//!
//! The loader logs through an injectable [`Logger`]; the default forwards to
//! `tracing`.

mod traits;
mod noop;
mod tracing_logger;

pub use traits::{Logger, SharedLogger};
pub use noop::NoOpLogger;
pub use tracing_logger::{TracingLogger, LOG_TARGET};
