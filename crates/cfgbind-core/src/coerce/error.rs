//! Coercion error type

use thiserror::Error;

use crate::types::{Shape, Value};

/// A raw value could not be converted to the requested shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot convert {raw} to {shape}: {reason}")]
pub struct CoerceError {
    /// Rendered raw value
    pub raw: String,
    /// Name of the target shape
    pub shape: String,
    pub reason: String,
}

impl CoerceError {
    pub fn new(raw: &Value, shape: &Shape, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.to_string(),
            shape: shape.to_string(),
            reason: reason.into(),
        }
    }

    /// Error for a value whose variant the shape never accepts
    pub fn unsupported(raw: &Value, shape: &Shape) -> Self {
        Self::new(raw, shape, format!("{} values are not accepted", raw.kind()))
    }

    /// Same error with the raw value hidden, for secret fields
    pub fn redacted(self) -> Self {
        Self {
            raw: REDACTED.to_string(),
            ..self
        }
    }
}

/// Placeholder shown instead of a secret value
pub const REDACTED: &str = "<redacted>";

pub type CoerceResult<T> = Result<T, CoerceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntKind;

    #[test]
    fn test_message_includes_raw_and_shape() {
        let err = CoerceError::new(&Value::from("80x"), &Shape::Int(IntKind::U16), "invalid digit");
        assert_eq!(err.to_string(), "cannot convert \"80x\" to u16: invalid digit");
    }

    #[test]
    fn test_redacted_hides_raw() {
        let err = CoerceError::new(&Value::from("hunter2"), &Shape::Bool, "expected true/false").redacted();
        assert_eq!(err.to_string(), "cannot convert <redacted> to bool: expected true/false");
    }
}
