//! Per-field coercion through the transform pipeline.

use std::collections::BTreeMap;

use log::trace;

use super::ensure_depth;
use crate::coerce::{coerce_value, convert_value, ConstraintValidator};
use crate::error::{Error, Result};
use crate::schema::{FieldDef, Schema};
use crate::transform::is_compatible;
use crate::transform::pipeline::{apply_after, apply_before, apply_struct, incompatible_before_output};
use crate::value::{Record, Value};

/// Coerces raw field values into typed values, building nested records.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resolver {
    max_depth: Option<usize>,
}

impl Resolver {
    pub(crate) fn new(max_depth: Option<usize>) -> Self {
        Self { max_depth }
    }

    /// Runs one field value through before transforms, coercion, after
    /// transforms and constraint validation.
    ///
    /// `depth` is the depth of the record owning the field; a nested value
    /// is built one level below it.
    pub(crate) fn coerce_field(
        &self,
        schema: &Schema,
        field: &FieldDef,
        raw: Value,
        path: &str,
        depth: usize,
    ) -> Result<Value> {
        let shown = match &raw {
            Value::Str(text) => text.clone(),
            other => other.to_string(),
        };
        trace!("coercing {path} from {shown}");

        let value = match raw {
            Value::Str(_) => {
                let transformed = apply_before(schema, field, path, raw)?;
                match transformed {
                    Value::Str(text) => self.coerce_text(field, &text, path, depth)?,
                    Value::Map(entries) if field.ty().nested_schema().is_some() => {
                        self.coerce_nested(field, entries, path, depth)?
                    }
                    other if is_compatible(&other, field.ty()) => other,
                    other => return Err(incompatible_before_output(field, path, &other)),
                }
            }
            Value::Map(entries) if field.ty().nested_schema().is_some() => {
                self.coerce_nested(field, entries, path, depth)?
            }
            other => convert_value(&other, field.ty(), path)?,
        };

        let value = apply_after(schema, field, path, value)?;
        ConstraintValidator::new(field.info()).validate(&value, path, &field.ty().type_name(), &shown)?;
        Ok(value)
    }

    fn coerce_text(&self, field: &FieldDef, text: &str, path: &str, depth: usize) -> Result<Value> {
        let Some(nested) = field.ty().nested_schema() else {
            return coerce_value(text, field.ty(), path, field.info());
        };

        let parse_error = |source: Option<crate::error::BoxError>| Error::Parse {
            field: path.to_string(),
            target_type: field.ty().type_name(),
            raw_value: text.to_string(),
            source,
        };
        let json: serde_json::Value =
            serde_json::from_str(text).map_err(|err| parse_error(Some(Box::new(err))))?;
        match Value::from_json(&json) {
            Value::Map(entries) => {
                ensure_depth(self.max_depth, depth + 1, path)?;
                self.build_record(nested.get(), entries, path, depth + 1)
                    .map(Value::Record)
            }
            Value::Null if field.ty().is_nullable() => Ok(Value::Null),
            other => Err(parse_error(Some(
                format!("expected a JSON object, got {}", other.kind()).into(),
            ))),
        }
    }

    fn coerce_nested(
        &self,
        field: &FieldDef,
        entries: BTreeMap<String, Value>,
        path: &str,
        depth: usize,
    ) -> Result<Value> {
        let Some(nested) = field.ty().nested_schema() else {
            return convert_value(&Value::Map(entries), field.ty(), path);
        };
        ensure_depth(self.max_depth, depth + 1, path)?;
        self.build_record(nested.get(), entries, path, depth + 1)
            .map(Value::Record)
    }

    /// Builds a record of `schema` from a raw mapping, then applies the
    /// schema's struct transforms.
    ///
    /// Keys the schema does not declare are ignored.
    pub(crate) fn build_record(
        &self,
        schema: &Schema,
        mut entries: BTreeMap<String, Value>,
        path: &str,
        depth: usize,
    ) -> Result<Record> {
        let shown = Value::Map(entries.clone()).to_string();
        let mut record = Record::new(schema.name());

        for field in schema.fields() {
            let field_path = format!("{path}.{}", field.name());
            let raw = match entries.remove(field.name()) {
                Some(raw) => raw,
                None => match field.default_value() {
                    Some(default) => default.clone(),
                    None => {
                        return Err(Error::Parse {
                            field: path.to_string(),
                            target_type: schema.name().to_string(),
                            raw_value: shown,
                            source: Some(
                                format!("missing required field '{}'", field.name()).into(),
                            ),
                        })
                    }
                },
            };
            let value = self.coerce_field(schema, field, raw, &field_path, depth)?;
            record.insert(field.name(), value);
        }

        apply_struct(schema, &mut record, path)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::schema::{Field, FieldType};
    use crate::transform::{FieldTransform, StructTransform};

    fn inner() -> Arc<Schema> {
        Arc::new(
            Schema::builder("Inner")
                .field(Field::new("host", FieldType::Str))
                .field(Field::new("port", FieldType::Int).default(5432).gt(0))
                .transform(FieldTransform::before("trim", "host", |value: Value| {
                    Ok(Value::from(value.as_str().unwrap_or_default().trim()))
                }))
                .build()
                .unwrap(),
        )
    }

    fn outer() -> Schema {
        Schema::builder("Outer")
            .field(Field::new("db", FieldType::shared(inner())))
            .field(Field::new("count", FieldType::Int))
            .build()
            .unwrap()
    }

    #[test]
    fn test_nested_json_runs_inner_transforms_and_defaults() {
        let schema = outer();
        let field = schema.field("db").unwrap();
        let value = Resolver::new(None)
            .coerce_field(&schema, field, Value::from(r#"{"host": "  db  "}"#), "db", 0)
            .unwrap();
        let record = value.as_record().unwrap();
        assert_eq!(record.schema_name(), "Inner");
        assert_eq!(record.get("host"), Some(&Value::from("db")));
        assert_eq!(record.get("port"), Some(&Value::Int(5432)));
    }

    #[test]
    fn test_nested_requires_object() {
        let schema = outer();
        let field = schema.field("db").unwrap();
        let err = Resolver::new(None)
            .coerce_field(&schema, field, Value::from("[1, 2]"), "db", 0)
            .unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_missing_nested_field_reports_parent_path() {
        let schema = outer();
        let field = schema.field("db").unwrap();
        match Resolver::new(None)
            .coerce_field(&schema, field, Value::from("{}"), "db", 0)
            .unwrap_err()
        {
            Error::Parse {
                field,
                target_type,
                source,
                ..
            } => {
                assert_eq!(field, "db");
                assert_eq!(target_type, "Inner");
                assert_eq!(source.unwrap().to_string(), "missing required field 'host'");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nested_constraint_path() {
        let schema = outer();
        let field = schema.field("db").unwrap();
        match Resolver::new(None)
            .coerce_field(&schema, field, Value::from(r#"{"host": "h", "port": 0}"#), "db", 0)
            .unwrap_err()
        {
            Error::Parse { field, .. } => assert_eq!(field, "db.port"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_depth_limit_applies_to_nested_field() {
        let schema = outer();
        let field = schema.field("db").unwrap();
        let err = Resolver::new(Some(1))
            .coerce_field(&schema, field, Value::from(r#"{"host": "h"}"#), "db", 1)
            .unwrap_err();
        assert!(err.is_nested_depth());
    }

    #[test]
    fn test_before_returning_incompatible_value() {
        let schema = Schema::builder("S")
            .field(Field::new("count", FieldType::Int))
            .transform(FieldTransform::before("listify", "count", |_| {
                Ok(Value::List(vec![]))
            }))
            .build()
            .unwrap();
        let field = schema.field("count").unwrap();
        match Resolver::new(None)
            .coerce_field(&schema, field, Value::from("1"), "count", 0)
            .unwrap_err()
        {
            Error::Transform {
                transform_name,
                reason,
                ..
            } => {
                assert_eq!(transform_name, "<before-transform-chain>");
                assert_eq!(reason, "before transform returned incompatible type");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_before_returning_compatible_value_skips_parsing() {
        let schema = Schema::builder("S")
            .field(Field::new("count", FieldType::Int))
            .transform(FieldTransform::before("fixed", "count", |_| Ok(Value::Int(7))))
            .build()
            .unwrap();
        let field = schema.field("count").unwrap();
        let value = Resolver::new(None)
            .coerce_field(&schema, field, Value::from("not a number"), "count", 0)
            .unwrap();
        assert_eq!(value, Value::Int(7));
    }

    #[test]
    fn test_non_string_values_are_converted() {
        let schema = outer();
        let field = schema.field("count").unwrap();
        let resolver = Resolver::new(None);
        assert_eq!(
            resolver.coerce_field(&schema, field, Value::Int(4), "count", 0).unwrap(),
            Value::Int(4)
        );
        assert!(resolver
            .coerce_field(&schema, field, Value::Bool(true), "count", 0)
            .unwrap_err()
            .is_parse());
    }

    #[test]
    fn test_nested_struct_transform_scoped_to_path() {
        let inner = Arc::new(
            Schema::builder("Inner")
                .field(Field::new("a", FieldType::Int))
                .struct_transform(StructTransform::new("fail", |_| Err("nope".into())))
                .build()
                .unwrap(),
        );
        let schema = Schema::builder("Outer")
            .field(Field::new("inner", FieldType::shared(inner)))
            .build()
            .unwrap();
        let field = schema.field("inner").unwrap();
        match Resolver::new(None)
            .coerce_field(&schema, field, Value::from(r#"{"a": 1}"#), "inner", 0)
            .unwrap_err()
        {
            Error::Transform {
                field,
                transform_name,
                reason,
                ..
            } => {
                assert_eq!(field, "inner");
                assert_eq!(transform_name, "fail");
                assert_eq!(reason, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
