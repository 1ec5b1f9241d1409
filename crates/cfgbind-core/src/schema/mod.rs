//! Static description of configuration types
//!
//! A configuration type implements [`Settings`] and lists its fields through
//! the [`Fields`] builder. Leaf field types implement [`Leaf`].

mod traits;
mod fields;

pub use traits::{Leaf, Settings};
pub use fields::{join_path, Field, Fields, Schema};

pub(crate) use fields::FieldKind;
