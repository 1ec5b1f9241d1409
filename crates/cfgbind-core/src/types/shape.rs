//! Static shapes of configuration fields and the typed values bound to them

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::value::ValueMap;

/// Integer widths supported by the coercion engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntKind {
    pub fn is_signed(&self) -> bool {
        matches!(self, IntKind::I8 | IntKind::I16 | IntKind::I32 | IntKind::I64)
    }

    /// Inclusive bounds of the width, widened so both signed and unsigned fit
    pub fn bounds(&self) -> (i128, i128) {
        match self {
            IntKind::I8 => (i8::MIN as i128, i8::MAX as i128),
            IntKind::I16 => (i16::MIN as i128, i16::MAX as i128),
            IntKind::I32 => (i32::MIN as i128, i32::MAX as i128),
            IntKind::I64 => (i64::MIN as i128, i64::MAX as i128),
            IntKind::U8 => (0, u8::MAX as i128),
            IntKind::U16 => (0, u16::MAX as i128),
            IntKind::U32 => (0, u32::MAX as i128),
            IntKind::U64 => (0, u64::MAX as i128),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntKind::I8 => "i8",
            IntKind::I16 => "i16",
            IntKind::I32 => "i32",
            IntKind::I64 => "i64",
            IntKind::U8 => "u8",
            IntKind::U16 => "u16",
            IntKind::U32 => "u32",
            IntKind::U64 => "u64",
        }
    }
}

/// Float widths supported by the coercion engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatKind {
    F32,
    F64,
}

/// Shape of a declared field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Text,
    Bool,
    Int(IntKind),
    Float(FloatKind),
    Duration,
    Timestamp,
    TextList,
    /// Present/absent wrapper around an inner shape
    Optional(Box<Shape>),
    /// Nested section; the binder recurses into it
    Group,
}

impl Shape {
    pub fn optional(inner: Shape) -> Self {
        Shape::Optional(Box::new(inner))
    }

    /// Shape with every optional wrapper removed
    pub fn unwrapped(&self) -> &Shape {
        match self {
            Shape::Optional(inner) => inner.unwrapped(),
            other => other,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Text => write!(f, "text"),
            Shape::Bool => write!(f, "bool"),
            Shape::Int(kind) => write!(f, "{}", kind.as_str()),
            Shape::Float(FloatKind::F32) => write!(f, "f32"),
            Shape::Float(FloatKind::F64) => write!(f, "f64"),
            Shape::Duration => write!(f, "duration"),
            Shape::Timestamp => write!(f, "timestamp"),
            Shape::TextList => write!(f, "text list"),
            Shape::Optional(inner) => write!(f, "optional {}", inner),
            Shape::Group => write!(f, "group"),
        }
    }
}

/// A value that already matches a static shape
///
/// Produced by the coercion engine, consumed by field slots and the
/// validation engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Typed {
    Text(String),
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Duration(Duration),
    Timestamp(DateTime<Utc>),
    TextList(Vec<String>),
    Optional(Option<Box<Typed>>),
    /// Group data passed through untouched
    Group(ValueMap),
}

impl Typed {
    /// Whether this is the zero value of its shape
    pub fn is_zero(&self) -> bool {
        match self {
            Typed::Text(s) => s.is_empty(),
            Typed::Bool(b) => !b,
            Typed::Int(i) => *i == 0,
            Typed::Uint(u) => *u == 0,
            Typed::Float(f) => *f == 0.0,
            Typed::Duration(d) => d.is_zero(),
            Typed::Timestamp(ts) => *ts == DateTime::<Utc>::default(),
            Typed::TextList(items) => items.is_empty(),
            Typed::Optional(inner) => inner.is_none(),
            Typed::Group(map) => map.is_empty(),
        }
    }

    /// Canonical string form used for membership checks
    pub fn canonical(&self) -> String {
        match self {
            Typed::Text(s) => s.clone(),
            Typed::Bool(b) => b.to_string(),
            Typed::Int(i) => i.to_string(),
            Typed::Uint(u) => u.to_string(),
            Typed::Float(f) => f.to_string(),
            Typed::Duration(d) => format_duration(*d),
            Typed::Timestamp(ts) => ts.to_rfc3339(),
            Typed::TextList(items) => items.join(","),
            Typed::Optional(Some(inner)) => inner.canonical(),
            Typed::Optional(None) => String::new(),
            Typed::Group(_) => String::new(),
        }
    }
}

/// Render a duration the way it is usually written in config files
///
/// `90m` renders as `1h30m0s`, `1500ms` as `1.5s`, `300ms` as `300ms`.
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }

    let nanos = d.as_nanos();
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}µs", trim_fraction(nanos, 1_000));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", trim_fraction(nanos, 1_000_000));
    }

    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = trim_fraction(u128::from(total_secs % 60) * 1_000_000_000 + u128::from(d.subsec_nanos()), 1_000_000_000);

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    out.push_str(&format!("{}s", seconds));
    out
}

fn trim_fraction(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let width = unit.to_string().len() - 1;
    let digits = format!("{:0width$}", frac, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
