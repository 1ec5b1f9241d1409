//! Custom validator trait

use thiserror::Error;

use crate::types::CancellationToken;
use super::error::{ErrorKind, FieldError, FieldErrors};

/// Failure reported by a custom validator
#[derive(Error, Debug)]
pub enum ValidationFailure {
    /// Structured field errors, appended to the aggregate as-is
    #[error(transparent)]
    Fields(FieldErrors),

    /// Opaque failure, appended as a single `custom` error
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl ValidationFailure {
    /// Opaque failure from a plain message
    pub fn message(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Other(message.into())
    }

    /// Single field error of the given kind
    pub fn field(field_path: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Fields(FieldErrors::from(vec![FieldError::new(field_path, kind, message)]))
    }

    /// Field errors to append to the aggregate
    pub fn into_field_errors(self) -> Vec<FieldError> {
        match self {
            ValidationFailure::Fields(errors) => errors.into_vec(),
            ValidationFailure::Other(error) => {
                vec![FieldError::new("", ErrorKind::Custom, error.to_string())]
            }
        }
    }
}

impl From<FieldErrors> for ValidationFailure {
    fn from(errors: FieldErrors) -> Self {
        Self::Fields(errors)
    }
}

/// Cross-field validation run after the tag constraints
///
/// Validators run in registration order against the bound object.
/// Closures of the form `Fn(&T) -> Result<(), ValidationFailure>` are
/// validators.
///
/// # Example
///
/// ```
/// use cfgbind_core::validate::{Validator, ValidationFailure};
///
/// struct Limits { soft: u32, hard: u32 }
///
/// let check = |l: &Limits| {
///     if l.soft > l.hard {
///         return Err(ValidationFailure::message("soft limit exceeds hard limit"));
///     }
///     Ok(())
/// };
/// let token = cfgbind_core::CancellationToken::new();
/// assert!(check.validate(&token, &Limits { soft: 5, hard: 1 }).is_err());
/// ```
pub trait Validator<T>: Send + Sync {
    fn validate(&self, cancel: &CancellationToken, target: &T) -> Result<(), ValidationFailure>;
}

impl<T, F> Validator<T> for F
where
    F: Fn(&T) -> Result<(), ValidationFailure> + Send + Sync,
{
    fn validate(&self, _cancel: &CancellationToken, target: &T) -> Result<(), ValidationFailure> {
        self(target)
    }
}
