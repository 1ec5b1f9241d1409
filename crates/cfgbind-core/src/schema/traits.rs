//! Traits implemented by configuration types and their leaf field types

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::{FloatKind, IntKind, Shape, Typed};
use super::fields::Fields;

/// A statically-shaped configuration type
///
/// Implementations describe their fields once, in declaration order. The
/// `Default` value is the zero value every load starts from.
///
/// # Example
///
/// ```
/// use cfgbind_core::schema::{Fields, Settings};
///
/// #[derive(Debug, Default)]
/// struct Server {
///     host: String,
///     port: u16,
/// }
///
/// impl Settings for Server {
///     fn describe(f: &mut Fields<Self>) {
///         f.field("Host", "required", |s| &s.host, |s| &mut s.host)
///             .field("Port", "default:8080,min:1024", |s| &s.port, |s| &mut s.port);
///     }
/// }
/// ```
pub trait Settings: Default + Send + Sync + 'static {
    /// Register every field with its name, directives and accessors
    fn describe(fields: &mut Fields<Self>);
}

/// A field type the binder can assign directly
pub trait Leaf: Sized + Send + Sync + 'static {
    /// Shape the coercion engine targets for this type
    fn shape() -> Shape;

    /// Convert a coerced value; `None` if it does not match [`Leaf::shape`]
    fn from_typed(typed: Typed) -> Option<Self>;

    fn to_typed(&self) -> Typed;
}

impl Leaf for String {
    fn shape() -> Shape {
        Shape::Text
    }

    fn from_typed(typed: Typed) -> Option<Self> {
        match typed {
            Typed::Text(s) => Some(s),
            _ => None,
        }
    }

    fn to_typed(&self) -> Typed {
        Typed::Text(self.clone())
    }
}

impl Leaf for bool {
    fn shape() -> Shape {
        Shape::Bool
    }

    fn from_typed(typed: Typed) -> Option<Self> {
        match typed {
            Typed::Bool(b) => Some(b),
            _ => None,
        }
    }

    fn to_typed(&self) -> Typed {
        Typed::Bool(*self)
    }
}

macro_rules! signed_leaf {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl Leaf for $ty {
            fn shape() -> Shape {
                Shape::Int(IntKind::$kind)
            }

            fn from_typed(typed: Typed) -> Option<Self> {
                match typed {
                    Typed::Int(i) => <$ty>::try_from(i).ok(),
                    _ => None,
                }
            }

            fn to_typed(&self) -> Typed {
                Typed::Int(i64::from(*self))
            }
        }
    )*};
}

macro_rules! unsigned_leaf {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl Leaf for $ty {
            fn shape() -> Shape {
                Shape::Int(IntKind::$kind)
            }

            fn from_typed(typed: Typed) -> Option<Self> {
                match typed {
                    Typed::Uint(u) => <$ty>::try_from(u).ok(),
                    _ => None,
                }
            }

            fn to_typed(&self) -> Typed {
                Typed::Uint(u64::from(*self))
            }
        }
    )*};
}

signed_leaf!(i8 => I8, i16 => I16, i32 => I32, i64 => I64);
unsigned_leaf!(u8 => U8, u16 => U16, u32 => U32, u64 => U64);

impl Leaf for f32 {
    fn shape() -> Shape {
        Shape::Float(FloatKind::F32)
    }

    fn from_typed(typed: Typed) -> Option<Self> {
        match typed {
            // Range was checked during coercion
            Typed::Float(f) => Some(f as f32),
            _ => None,
        }
    }

    fn to_typed(&self) -> Typed {
        Typed::Float(f64::from(*self))
    }
}

impl Leaf for f64 {
    fn shape() -> Shape {
        Shape::Float(FloatKind::F64)
    }

    fn from_typed(typed: Typed) -> Option<Self> {
        match typed {
            Typed::Float(f) => Some(f),
            _ => None,
        }
    }

    fn to_typed(&self) -> Typed {
        Typed::Float(*self)
    }
}

impl Leaf for Duration {
    fn shape() -> Shape {
        Shape::Duration
    }

    fn from_typed(typed: Typed) -> Option<Self> {
        match typed {
            Typed::Duration(d) => Some(d),
            _ => None,
        }
    }

    fn to_typed(&self) -> Typed {
        Typed::Duration(*self)
    }
}

impl Leaf for DateTime<Utc> {
    fn shape() -> Shape {
        Shape::Timestamp
    }

    fn from_typed(typed: Typed) -> Option<Self> {
        match typed {
            Typed::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    fn to_typed(&self) -> Typed {
        Typed::Timestamp(*self)
    }
}

impl Leaf for Vec<String> {
    fn shape() -> Shape {
        Shape::TextList
    }

    fn from_typed(typed: Typed) -> Option<Self> {
        match typed {
            Typed::TextList(items) => Some(items),
            _ => None,
        }
    }

    fn to_typed(&self) -> Typed {
        Typed::TextList(self.clone())
    }
}

impl<L: Leaf> Leaf for Option<L> {
    fn shape() -> Shape {
        Shape::optional(L::shape())
    }

    fn from_typed(typed: Typed) -> Option<Self> {
        match typed {
            Typed::Optional(None) => Some(None),
            Typed::Optional(Some(inner)) => L::from_typed(*inner).map(Some),
            _ => None,
        }
    }

    fn to_typed(&self) -> Typed {
        Typed::Optional(self.as_ref().map(|inner| Box::new(inner.to_typed())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_leaves() {
        assert_eq!(u16::shape(), Shape::Int(IntKind::U16));
        assert_eq!(u16::from_typed(Typed::Uint(8080)), Some(8080));
        assert_eq!(u16::from_typed(Typed::Int(8080)), None);
        assert_eq!(i8::from_typed(Typed::Int(-3)), Some(-3));
        assert_eq!(i8::from_typed(Typed::Int(300)), None);
        assert_eq!(42u32.to_typed(), Typed::Uint(42));
    }

    #[test]
    fn test_optional_leaf() {
        assert_eq!(Option::<u16>::shape(), Shape::optional(Shape::Int(IntKind::U16)));
        assert_eq!(Option::<u16>::from_typed(Typed::Optional(None)), Some(None));
        assert_eq!(
            Option::<u16>::from_typed(Typed::Optional(Some(Box::new(Typed::Uint(5))))),
            Some(Some(5))
        );
        assert_eq!(Some(7u16).to_typed(), Typed::Optional(Some(Box::new(Typed::Uint(7)))));
    }

    #[test]
    fn test_text_list_leaf() {
        let items = vec!["a".to_string(), "b".to_string()];
        assert_eq!(Vec::<String>::from_typed(items.to_typed()), Some(items));
    }
}
