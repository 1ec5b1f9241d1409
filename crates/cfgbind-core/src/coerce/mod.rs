//! Type coercion engine
//!
//! Converts a dynamic [`Value`] into a [`Typed`] value matching a static
//! [`Shape`]. Coercion is total: every combination of value and shape yields
//! either a typed value or a [`CoerceError`], never a panic.

mod error;
mod duration;
mod timestamp;

use std::time::Duration;

use crate::types::{FloatKind, IntKind, Shape, Typed, Value};

pub use error::{CoerceError, CoerceResult, REDACTED};
pub use duration::parse_duration;
pub use timestamp::parse_timestamp;

/// Coerce a raw value into the given shape
pub fn coerce(raw: &Value, shape: &Shape) -> CoerceResult<Typed> {
    match shape {
        Shape::Optional(inner) => {
            if raw.is_null() {
                Ok(Typed::Optional(None))
            } else {
                coerce(raw, inner).map(|typed| Typed::Optional(Some(Box::new(typed))))
            }
        }
        Shape::Group => match raw {
            Value::Map(map) => Ok(Typed::Group(map.clone())),
            other => Err(CoerceError::unsupported(other, shape)),
        },
        Shape::Text => coerce_text(raw, shape).map(Typed::Text),
        Shape::Bool => coerce_bool(raw, shape).map(Typed::Bool),
        Shape::Int(kind) => coerce_int(raw, *kind, shape),
        Shape::Float(kind) => coerce_float(raw, *kind, shape).map(Typed::Float),
        Shape::Duration => coerce_duration(raw, shape).map(Typed::Duration),
        Shape::Timestamp => match raw {
            Value::Text(s) => parse_timestamp(s)
                .map(Typed::Timestamp)
                .map_err(|reason| CoerceError::new(raw, shape, reason)),
            other => Err(CoerceError::unsupported(other, shape)),
        },
        Shape::TextList => coerce_text_list(raw, shape).map(Typed::TextList),
    }
}

fn coerce_text(raw: &Value, shape: &Shape) -> CoerceResult<String> {
    raw.scalar_string()
        .ok_or_else(|| CoerceError::unsupported(raw, shape))
}

fn coerce_bool(raw: &Value, shape: &Shape) -> CoerceResult<bool> {
    match raw {
        Value::Bool(b) => Ok(*b),
        Value::Int(0) => Ok(false),
        Value::Int(1) => Ok(true),
        Value::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(CoerceError::new(raw, shape, "expected true/false, 1/0 or yes/no")),
        },
        Value::Int(_) => Err(CoerceError::new(raw, shape, "only 0 and 1 convert to bool")),
        other => Err(CoerceError::unsupported(other, shape)),
    }
}

fn coerce_int(raw: &Value, kind: IntKind, shape: &Shape) -> CoerceResult<Typed> {
    let wide: i128 = match raw {
        Value::Int(i) => i128::from(*i),
        Value::Float(f) => {
            if !f.is_finite() || f.fract() != 0.0 {
                return Err(CoerceError::new(raw, shape, "not an integral number"));
            }
            // Integral and finite; values beyond i128 saturate and fail the range check
            *f as i128
        }
        Value::Text(s) => s
            .trim()
            .parse::<i128>()
            .map_err(|e| CoerceError::new(raw, shape, e.to_string()))?,
        other => return Err(CoerceError::unsupported(other, shape)),
    };

    let (lo, hi) = kind.bounds();
    if wide < lo || wide > hi {
        return Err(CoerceError::new(
            raw,
            shape,
            format!("out of range {}..={}", lo, hi),
        ));
    }

    if kind.is_signed() {
        i64::try_from(wide)
            .map(Typed::Int)
            .map_err(|e| CoerceError::new(raw, shape, e.to_string()))
    } else {
        u64::try_from(wide)
            .map(Typed::Uint)
            .map_err(|e| CoerceError::new(raw, shape, e.to_string()))
    }
}

fn coerce_float(raw: &Value, kind: FloatKind, shape: &Shape) -> CoerceResult<f64> {
    let value = match raw {
        Value::Float(f) => *f,
        Value::Int(i) => *i as f64,
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| CoerceError::new(raw, shape, e.to_string()))?,
        other => return Err(CoerceError::unsupported(other, shape)),
    };

    if kind == FloatKind::F32 && value.is_finite() && value.abs() > f64::from(f32::MAX) {
        return Err(CoerceError::new(raw, shape, "out of range for f32"));
    }
    Ok(value)
}

fn coerce_duration(raw: &Value, shape: &Shape) -> CoerceResult<Duration> {
    match raw {
        Value::Text(s) => parse_duration(s).map_err(|reason| CoerceError::new(raw, shape, reason)),
        Value::Int(nanos) => u64::try_from(*nanos)
            .map(Duration::from_nanos)
            .map_err(|_| CoerceError::new(raw, shape, "negative durations are not supported")),
        other => Err(CoerceError::unsupported(other, shape)),
    }
}

fn coerce_text_list(raw: &Value, shape: &Shape) -> CoerceResult<Vec<String>> {
    match raw {
        Value::List(items) => items
            .iter()
            .map(|item| {
                item.scalar_string().ok_or_else(|| {
                    CoerceError::new(raw, shape, format!("{} elements are not accepted", item.kind()))
                })
            })
            .collect(),
        Value::Text(s) if s.is_empty() => Ok(Vec::new()),
        Value::Text(s) => Ok(s.split(',').map(|part| part.trim().to_string()).collect()),
        other => Err(CoerceError::unsupported(other, shape)),
    }
}
