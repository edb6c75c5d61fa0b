//! Field and struct transforms.
//!
//! A [`FieldTransform`] is a named hook bound to one top-level field of a
//! schema. `before` transforms run on the raw string prior to coercion,
//! `after` transforms on the coerced value. A [`StructTransform`] runs on a
//! constructed [`Record`] and mutates it in place.
//!
//! Every transform takes a sequence number when it is created. When a schema
//! is built, its own transforms are sorted by that number and spliced onto
//! the registry inherited from its parent: a transform whose name is already
//! registered replaces the inherited entry, which is removed and the new one
//! appended.
//!
//! # Examples
//!
//! ```
//! use strictenv::{Field, FieldTransform, FieldType, Schema, Value};
//!
//! let schema = Schema::builder("Service")
//!     .field(Field::new("name", FieldType::Str))
//!     .transform(FieldTransform::before("trim", "name", |value: Value| {
//!         Ok(match value {
//!             Value::Str(s) => Value::Str(s.trim().to_string()),
//!             other => other,
//!         })
//!     }))
//!     .build()
//!     .unwrap();
//! assert_eq!(schema.transforms().before("name").len(), 1);
//! ```

pub mod pipeline;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{BoxError, TransformMode};
use crate::schema::Schema;
use crate::value::{Record, Value};

pub use pipeline::is_compatible;

static TRANSFORM_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_order() -> u64 {
    TRANSFORM_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Signature of a value transform taking only the value.
pub type ValueFn = dyn Fn(Value) -> Result<Value, BoxError> + Send + Sync;

/// Signature of a value transform that also receives the schema being loaded.
pub type SchemaValueFn = dyn Fn(&Schema, Value) -> Result<Value, BoxError> + Send + Sync;

/// Signature of a struct transform taking only the record.
pub type RecordFn = dyn Fn(&mut Record) -> Result<(), BoxError> + Send + Sync;

/// Signature of a struct transform that also receives the schema.
pub type SchemaRecordFn = dyn Fn(&Schema, &mut Record) -> Result<(), BoxError> + Send + Sync;

/// A field transform callable: `(value)` or `(schema, value)`.
#[derive(Clone)]
pub enum TransformFn {
    /// Receives the value.
    Value(Arc<ValueFn>),
    /// Receives the loading schema, then the value.
    WithSchema(Arc<SchemaValueFn>),
}

impl TransformFn {
    pub(crate) fn call(&self, schema: &Schema, value: Value) -> Result<Value, BoxError> {
        match self {
            Self::Value(func) => func(value),
            Self::WithSchema(func) => func(schema, value),
        }
    }
}

/// A struct transform callable: `(record)` or `(schema, record)`.
#[derive(Clone)]
pub enum StructTransformFn {
    /// Receives the record.
    Record(Arc<RecordFn>),
    /// Receives the schema, then the record.
    WithSchema(Arc<SchemaRecordFn>),
}

impl StructTransformFn {
    pub(crate) fn call(&self, schema: &Schema, record: &mut Record) -> Result<(), BoxError> {
        match self {
            Self::Record(func) => func(record),
            Self::WithSchema(func) => func(schema, record),
        }
    }
}

/// A named transform bound to one field.
#[derive(Clone)]
pub struct FieldTransform {
    name: String,
    field: String,
    mode: TransformMode,
    func: TransformFn,
    order: u64,
}

impl FieldTransform {
    fn with_fn(
        name: impl Into<String>,
        field: impl Into<String>,
        mode: TransformMode,
        func: TransformFn,
    ) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            mode,
            func,
            order: next_order(),
        }
    }

    /// Transform applied to the raw string before coercion.
    pub fn before<F>(name: impl Into<String>, field: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::with_fn(name, field, TransformMode::Before, TransformFn::Value(Arc::new(func)))
    }

    /// Transform applied to the coerced value.
    pub fn after<F>(name: impl Into<String>, field: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::with_fn(name, field, TransformMode::After, TransformFn::Value(Arc::new(func)))
    }

    /// Before transform that also receives the loading schema.
    pub fn before_with_schema<F>(name: impl Into<String>, field: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Schema, Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::with_fn(
            name,
            field,
            TransformMode::Before,
            TransformFn::WithSchema(Arc::new(func)),
        )
    }

    /// After transform that also receives the loading schema.
    pub fn after_with_schema<F>(name: impl Into<String>, field: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Schema, Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::with_fn(
            name,
            field,
            TransformMode::After,
            TransformFn::WithSchema(Arc::new(func)),
        )
    }

    /// Registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field the transform is bound to.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// `Before` or `After`.
    #[must_use]
    pub fn mode(&self) -> TransformMode {
        self.mode
    }

    pub(crate) fn func(&self) -> &TransformFn {
        &self.func
    }
}

impl fmt::Debug for FieldTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTransform")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("mode", &self.mode)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// A named whole-record transform.
#[derive(Clone)]
pub struct StructTransform {
    name: String,
    func: StructTransformFn,
    order: u64,
}

impl StructTransform {
    /// Struct transform receiving the record.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Record) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: StructTransformFn::Record(Arc::new(func)),
            order: next_order(),
        }
    }

    /// Struct transform receiving the schema and the record.
    pub fn with_schema<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Schema, &mut Record) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: StructTransformFn::WithSchema(Arc::new(func)),
            order: next_order(),
        }
    }

    /// Registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn func(&self) -> &StructTransformFn {
        &self.func
    }
}

impl fmt::Debug for StructTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructTransform")
            .field("name", &self.name)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
struct FieldTransforms {
    before: Vec<FieldTransform>,
    after: Vec<FieldTransform>,
}

/// Composed per-field transform lists of a schema.
#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    fields: Vec<(String, FieldTransforms)>,
}

impl TransformRegistry {
    /// Splices `declared` onto a copy of `inherited`.
    pub(crate) fn compose(inherited: &TransformRegistry, mut declared: Vec<FieldTransform>) -> Self {
        let mut registry = inherited.clone();
        declared.sort_by_key(|transform| transform.order);
        for transform in declared {
            registry.remove_named(&transform.name);
            let slot = registry.slot_mut(&transform.field);
            match transform.mode {
                TransformMode::Before => slot.before.push(transform),
                _ => slot.after.push(transform),
            }
        }
        registry
    }

    fn remove_named(&mut self, name: &str) {
        for (_, transforms) in &mut self.fields {
            transforms.before.retain(|t| t.name != name);
            transforms.after.retain(|t| t.name != name);
        }
    }

    fn slot_mut(&mut self, field: &str) -> &mut FieldTransforms {
        let position = match self.fields.iter().position(|(name, _)| name == field) {
            Some(position) => position,
            None => {
                self.fields.push((field.to_string(), FieldTransforms::default()));
                self.fields.len() - 1
            }
        };
        &mut self.fields[position].1
    }

    fn slot(&self, field: &str) -> Option<&FieldTransforms> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, transforms)| transforms)
    }

    /// Before transforms of `field`, in application order.
    #[must_use]
    pub fn before(&self, field: &str) -> &[FieldTransform] {
        self.slot(field).map_or(&[], |slot| slot.before.as_slice())
    }

    /// After transforms of `field`, in application order.
    #[must_use]
    pub fn after(&self, field: &str) -> &[FieldTransform] {
        self.slot(field).map_or(&[], |slot| slot.after.as_slice())
    }
}

/// Splices `declared` struct transforms onto a copy of `inherited`.
pub(crate) fn compose_struct_transforms(
    inherited: &[StructTransform],
    mut declared: Vec<StructTransform>,
) -> Vec<StructTransform> {
    let mut composed = inherited.to_vec();
    declared.sort_by_key(|transform| transform.order);
    for transform in declared {
        composed.retain(|existing| existing.name != transform.name);
        composed.push(transform);
    }
    composed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(transforms: &[FieldTransform]) -> Vec<&str> {
        transforms.iter().map(FieldTransform::name).collect()
    }

    fn identity(name: &str, field: &str) -> FieldTransform {
        FieldTransform::before(name, field, Ok)
    }

    #[test]
    fn test_compose_keeps_declaration_order() {
        let first = identity("first", "a");
        let second = identity("second", "a");
        let registry = TransformRegistry::compose(&TransformRegistry::default(), vec![second, first]);
        assert_eq!(names(registry.before("a")), ["first", "second"]);
        assert!(registry.after("a").is_empty());
        assert!(registry.before("b").is_empty());
    }

    #[test]
    fn test_inherited_first_then_own() {
        let parent = TransformRegistry::compose(&TransformRegistry::default(), vec![identity("p", "a")]);
        let child = TransformRegistry::compose(&parent, vec![identity("c", "a")]);
        assert_eq!(names(child.before("a")), ["p", "c"]);
        assert_eq!(names(parent.before("a")), ["p"]);
    }

    #[test]
    fn test_redeclared_name_replaces_inherited_entry() {
        let parent = TransformRegistry::compose(
            &TransformRegistry::default(),
            vec![identity("shared", "a"), identity("other", "a")],
        );
        let child = TransformRegistry::compose(&parent, vec![identity("shared", "a")]);
        assert_eq!(names(child.before("a")), ["other", "shared"]);
    }

    #[test]
    fn test_redeclared_name_moves_across_fields_and_modes() {
        let parent = TransformRegistry::compose(&TransformRegistry::default(), vec![identity("t", "a")]);
        let child = TransformRegistry::compose(&parent, vec![FieldTransform::after("t", "b", Ok)]);
        assert!(child.before("a").is_empty());
        assert_eq!(names(child.after("b")), ["t"]);
    }

    #[test]
    fn test_struct_transform_composition() {
        let parent = compose_struct_transforms(
            &[],
            vec![StructTransform::new("mutate", |_| Ok(())), StructTransform::new("log", |_| Ok(()))],
        );
        let child = compose_struct_transforms(&parent, vec![StructTransform::new("mutate", |_| Ok(()))]);
        let names: Vec<&str> = child.iter().map(StructTransform::name).collect();
        assert_eq!(names, ["log", "mutate"]);
    }
}
