//! Build-time schema description
//!
//! A [`Schema`] is the declared-order list of a configuration type's fields.
//! Each field knows its name, its parsed directives and how to reach its
//! storage in the target value. Groups carry the schema of the nested type,
//! so the binder, the validator and the key-space auditor all walk the same
//! tree.

use crate::audit::{self, KeySpace};
use crate::bind::Binder;
use crate::directive::{self, DirectiveSet};
use crate::types::{Shape, Typed};
use crate::validate::{self, FieldError};
use super::traits::{Leaf, Settings};

/// Join a dotted path prefix and a segment
pub fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else if segment.is_empty() {
        prefix.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}

/// Declared-order field list of a [`Settings`] type
pub struct Schema<T> {
    fields: Vec<Field<T>>,
}

impl<T: Settings> Schema<T> {
    /// Build the schema by running [`Settings::describe`]
    pub fn of() -> Self {
        let mut fields = Fields::new();
        T::describe(&mut fields);
        Self { fields: fields.fields }
    }
}

impl<T> Schema<T> {
    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<T> std::fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.fields.iter().map(|field| (field.name, field.shape())))
            .finish()
    }
}

/// One declared field
pub struct Field<T> {
    name: &'static str,
    directives: DirectiveSet,
    kind: FieldKind<T>,
}

pub(crate) enum FieldKind<T> {
    Leaf(Box<dyn LeafSlot<T>>),
    Group(Box<dyn GroupSlot<T>>),
}

impl<T> Field<T> {
    /// Declared name, used for field paths
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn directives(&self) -> &DirectiveSet {
        &self.directives
    }

    pub fn shape(&self) -> Shape {
        match &self.kind {
            FieldKind::Leaf(slot) => slot.shape().clone(),
            FieldKind::Group(slot) if slot.is_optional() => Shape::optional(Shape::Group),
            FieldKind::Group(_) => Shape::Group,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, FieldKind::Group(_))
    }

    /// Lookup key of this field under `prefix`
    ///
    /// An explicit `name:` key is absolute. Otherwise the segment is the
    /// `prefix:` directive (groups only) or the lowercased declared name.
    pub fn key_path(&self, prefix: &str) -> String {
        if let Some(explicit) = &self.directives.explicit_key {
            return explicit.to_lowercase();
        }
        let segment = match (&self.kind, &self.directives.group_prefix) {
            (FieldKind::Group(_), Some(group_prefix)) => group_prefix.to_lowercase(),
            _ => self.name.to_lowercase(),
        };
        join_path(prefix, &segment)
    }

    /// Declared-name path of this field under `prefix`
    pub fn field_path(&self, prefix: &str) -> String {
        join_path(prefix, self.name)
    }

    pub(crate) fn kind(&self) -> &FieldKind<T> {
        &self.kind
    }
}

/// Builder handed to [`Settings::describe`]
pub struct Fields<T> {
    fields: Vec<Field<T>>,
}

impl<T: 'static> Fields<T> {
    pub(crate) fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Register a leaf field (scalars, durations, timestamps, text lists
    /// and `Option`s of those)
    pub fn field<F: Leaf>(
        &mut self,
        name: &'static str,
        directives: &str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        self.push(name, directives, FieldKind::Leaf(Box::new(LeafAccess {
            shape: F::shape(),
            get,
            get_mut,
        })))
    }

    /// Register a nested section
    pub fn group<G: Settings>(
        &mut self,
        name: &'static str,
        directives: &str,
        get: fn(&T) -> &G,
        get_mut: fn(&mut T) -> &mut G,
    ) -> &mut Self {
        self.push(name, directives, FieldKind::Group(Box::new(GroupAccess {
            schema: Schema::<G>::of(),
            get,
            get_mut,
        })))
    }

    /// Register a nested section that is only present when data exists for it
    pub fn optional_group<G: Settings>(
        &mut self,
        name: &'static str,
        directives: &str,
        get: fn(&T) -> &Option<G>,
        get_mut: fn(&mut T) -> &mut Option<G>,
    ) -> &mut Self {
        self.push(name, directives, FieldKind::Group(Box::new(OptionalGroupAccess {
            schema: Schema::<G>::of(),
            get,
            get_mut,
        })))
    }

    fn push(&mut self, name: &'static str, directives: &str, kind: FieldKind<T>) -> &mut Self {
        self.fields.push(Field {
            name,
            directives: directive::parse(directives),
            kind,
        });
        self
    }
}

/// Type-erased access to a leaf field
pub(crate) trait LeafSlot<T>: Send + Sync {
    fn shape(&self) -> &Shape;

    fn read(&self, target: &T) -> Typed;

    /// Store a coerced value; `false` if it does not fit the field type
    fn write(&self, target: &mut T, value: Typed) -> bool;
}

struct LeafAccess<T, F> {
    shape: Shape,
    get: fn(&T) -> &F,
    get_mut: fn(&mut T) -> &mut F,
}

impl<T: 'static, F: Leaf> LeafSlot<T> for LeafAccess<T, F> {
    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn read(&self, target: &T) -> Typed {
        (self.get)(target).to_typed()
    }

    fn write(&self, target: &mut T, value: Typed) -> bool {
        match F::from_typed(value) {
            Some(v) => {
                *(self.get_mut)(target) = v;
                true
            }
            None => false,
        }
    }
}

/// Type-erased access to a nested section
///
/// Each walk over the tree has a method here so the walk can continue into
/// the nested type's own schema.
pub(crate) trait GroupSlot<T>: Send + Sync {
    fn is_optional(&self) -> bool;

    fn is_present(&self, target: &T) -> bool;

    fn bind(&self, binder: &mut Binder<'_>, target: &mut T, key_path: &str, field_path: &str);

    fn validate(&self, target: &T, field_path: &str, out: &mut Vec<FieldError>);

    fn collect_keys(&self, key_path: &str, space: &mut KeySpace);

    fn check_defaults(&self, field_path: &str, out: &mut Vec<FieldError>);
}

struct GroupAccess<T, G> {
    schema: Schema<G>,
    get: fn(&T) -> &G,
    get_mut: fn(&mut T) -> &mut G,
}

impl<T: 'static, G: Settings> GroupSlot<T> for GroupAccess<T, G> {
    fn is_optional(&self) -> bool {
        false
    }

    fn is_present(&self, _target: &T) -> bool {
        true
    }

    fn bind(&self, binder: &mut Binder<'_>, target: &mut T, key_path: &str, field_path: &str) {
        binder.bind_fields(&self.schema, (self.get_mut)(target), key_path, field_path);
    }

    fn validate(&self, target: &T, field_path: &str, out: &mut Vec<FieldError>) {
        validate::validate_fields(&self.schema, (self.get)(target), field_path, out);
    }

    fn collect_keys(&self, key_path: &str, space: &mut KeySpace) {
        audit::collect_fields(&self.schema, key_path, space);
    }

    fn check_defaults(&self, field_path: &str, out: &mut Vec<FieldError>) {
        audit::check_default_fields(&self.schema, field_path, out);
    }
}

struct OptionalGroupAccess<T, G> {
    schema: Schema<G>,
    get: fn(&T) -> &Option<G>,
    get_mut: fn(&mut T) -> &mut Option<G>,
}

impl<T: 'static, G: Settings> GroupSlot<T> for OptionalGroupAccess<T, G> {
    fn is_optional(&self) -> bool {
        true
    }

    fn is_present(&self, target: &T) -> bool {
        (self.get)(target).is_some()
    }

    fn bind(&self, binder: &mut Binder<'_>, target: &mut T, key_path: &str, field_path: &str) {
        if !binder.has_data_at(key_path) {
            return;
        }
        let inner = (self.get_mut)(target).get_or_insert_with(G::default);
        binder.bind_fields(&self.schema, inner, key_path, field_path);
    }

    fn validate(&self, target: &T, field_path: &str, out: &mut Vec<FieldError>) {
        if let Some(inner) = (self.get)(target) {
            validate::validate_fields(&self.schema, inner, field_path, out);
        }
    }

    fn collect_keys(&self, key_path: &str, space: &mut KeySpace) {
        audit::collect_fields(&self.schema, key_path, space);
    }

    fn check_defaults(&self, field_path: &str, out: &mut Vec<FieldError>) {
        audit::check_default_fields(&self.schema, field_path, out);
    }
}
