//! Validation of bound configuration
//!
//! Directive constraints are checked by [`validate_field`] and
//! [`validate_tree`]; cross-field rules plug in through [`Validator`].

mod error;
mod engine;
mod traits;

pub use error::{ErrorKind, FieldError, FieldErrors};
pub use engine::{validate_field, validate_tree};
pub use traits::{ValidationFailure, Validator};

pub(crate) use engine::validate_fields;
