//! Core types shared by the binding pipeline
//!
//! This module contains the dynamic value model, the static shape model and
//! the cancellation token.

mod value;
mod shape;
mod cancellation;

pub use value::{Value, ValueMap};
pub use shape::{Shape, IntKind, FloatKind, Typed, format_duration};
pub use cancellation::CancellationToken;
