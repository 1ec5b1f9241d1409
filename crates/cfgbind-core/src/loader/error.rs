//! Load errors

use crate::source::SourceError;
use crate::validate::FieldErrors;

/// Errors that can end a load attempt
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A source failed before anything was bound
    #[error("Source '{name}' failed: {error}")]
    Source {
        name: String,
        #[source]
        error: SourceError,
    },

    /// Coercion, constraint, unknown-key and custom validation failures
    #[error("Invalid configuration: {0}")]
    Invalid(FieldErrors),

    #[error("Load cancelled")]
    Cancelled,
}

impl LoadError {
    /// Aggregated field errors of an [`LoadError::Invalid`]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            LoadError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{ErrorKind, FieldError};

    #[test]
    fn test_display() {
        let err = LoadError::Invalid(FieldErrors::from(vec![
            FieldError::new("Host", ErrorKind::Required, "field is required"),
        ]));
        assert_eq!(
            err.to_string(),
            "Invalid configuration: 1 error(s)\n  - Host: required (field is required)"
        );
        assert_eq!(err.field_errors().map(FieldErrors::len), Some(1));

        let err = LoadError::Source {
            name: "env".into(),
            error: SourceError::NotAvailable("no such file".into()),
        };
        assert_eq!(err.to_string(), "Source 'env' failed: Source not available: no such file");
        assert!(err.field_errors().is_none());
    }
}
