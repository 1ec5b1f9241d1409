//! Binding merged data into configuration types

mod binder;
mod provenance;

pub use binder::{bind, BindOutcome, DEFAULT_SOURCE};
pub use provenance::{Provenance, ProvenanceRecord};

pub(crate) use binder::Binder;
