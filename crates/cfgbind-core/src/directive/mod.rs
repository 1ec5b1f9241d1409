//! Field directives
//!
//! Every declared field carries a directive string (`required`, `default:`,
//! `min:`, `max:`, `oneof:`, `name:`, `prefix:`, `secret`) that is parsed
//! once into a [`DirectiveSet`].

mod parser;

pub use parser::{parse, DirectiveSet};
