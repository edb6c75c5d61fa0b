//! Runtime application of field and struct transforms.

use log::trace;

use super::FieldTransform;
use crate::coerce::ConstraintValidator;
use crate::error::{BoxError, Error, Result, TransformMode};
use crate::schema::{FieldDef, FieldType, Schema};
use crate::value::{Record, Value};

/// Whether `value` may be stored in a field declared as `ty`.
///
/// `null` is only compatible with nullable types, a union accepts what any
/// member accepts, containers match on their kind alone and everything else
/// must be the exact kind the type coerces to.
///
/// # Examples
///
/// ```
/// use strictenv::{is_compatible, FieldType, Value};
///
/// assert!(is_compatible(&Value::Int(1), &FieldType::optional(FieldType::Int)));
/// assert!(is_compatible(&Value::Null, &FieldType::optional(FieldType::Int)));
/// assert!(!is_compatible(&Value::Null, &FieldType::Int));
/// assert!(!is_compatible(&Value::from("1"), &FieldType::Int));
/// assert!(is_compatible(&Value::List(vec![Value::from("x")]), &FieldType::list(FieldType::Int)));
/// ```
#[must_use]
pub fn is_compatible(value: &Value, ty: &FieldType) -> bool {
    match (ty, value) {
        (FieldType::Any, _) => true,
        (FieldType::Union(members), _) => members.iter().any(|member| is_compatible(value, member)),
        (FieldType::Null, Value::Null) => true,
        (_, Value::Null) | (FieldType::Null, _) => false,
        (FieldType::Str, Value::Str(_))
        | (FieldType::Bool, Value::Bool(_))
        | (FieldType::Int, Value::Int(_))
        | (FieldType::Float, Value::Float(_))
        | (FieldType::Date, Value::Date(_))
        | (FieldType::Time, Value::Time(_))
        | (FieldType::DateTime, Value::DateTime(_) | Value::NaiveDateTime(_))
        | (FieldType::Duration, Value::Duration(_))
        | (FieldType::List(_) | FieldType::Tuple(_), Value::List(_))
        | (FieldType::Set(_), Value::Set(_))
        | (FieldType::Map(_), Value::Map(_)) => true,
        (FieldType::Enum(spec), Value::Enum(member)) => member.enum_name == spec.name(),
        (FieldType::Nested(schema), Value::Record(record)) => record.schema_name() == schema.get().name(),
        _ => false,
    }
}

/// Runs the before transforms of `field` in order.
pub(crate) fn apply_before(schema: &Schema, field: &FieldDef, path: &str, value: Value) -> Result<Value> {
    let mut current = value;
    for transform in schema.transforms().before(field.name()) {
        trace!("before transform '{}' on {path}", transform.name());
        current = invoke(schema, transform, field.ty(), path, current)?;
    }
    Ok(current)
}

/// Runs the after transforms of `field` in order, checking the value stays
/// compatible with the declared type after each one.
pub(crate) fn apply_after(schema: &Schema, field: &FieldDef, path: &str, value: Value) -> Result<Value> {
    let mut current = value;
    for transform in schema.transforms().after(field.name()) {
        trace!("after transform '{}' on {path}", transform.name());
        current = invoke(schema, transform, field.ty(), path, current)?;
        if !is_compatible(&current, field.ty()) {
            return Err(Error::Transform {
                field: path.to_string(),
                mode: TransformMode::After,
                transform_name: transform.name().to_string(),
                target_type: field.ty().type_name(),
                value: Some(current.to_string()),
                reason: "after transform changed value to incompatible type".to_string(),
                source: None,
            });
        }
    }
    Ok(current)
}

/// Error for a before chain whose non-string output does not fit the field.
pub(crate) fn incompatible_before_output(field: &FieldDef, path: &str, value: &Value) -> Error {
    Error::Transform {
        field: path.to_string(),
        mode: TransformMode::Before,
        transform_name: "<before-transform-chain>".to_string(),
        target_type: field.ty().type_name(),
        value: Some(value.to_string()),
        reason: "before transform returned incompatible type".to_string(),
        source: None,
    }
}

fn invoke(schema: &Schema, transform: &FieldTransform, ty: &FieldType, path: &str, value: Value) -> Result<Value> {
    let shown = value.to_string();
    transform.func().call(schema, value).map_err(|err| {
        wrap_failure(err, |reason, source| Error::Transform {
            field: path.to_string(),
            mode: transform.mode(),
            transform_name: transform.name().to_string(),
            target_type: ty.type_name(),
            value: Some(shown),
            reason,
            source,
        })
    })
}

// A transform error raised from inside a transform passes through untouched;
// anything else is reported against the failing transform.
fn wrap_failure(err: BoxError, failed: impl FnOnce(String, Option<BoxError>) -> Error) -> Error {
    match err.downcast::<Error>() {
        Ok(inner) if inner.is_transform() => *inner,
        Ok(inner) => failed(inner.to_string(), Some(inner as BoxError)),
        Err(other) => failed(other.to_string(), Some(other)),
    }
}

/// Applies the struct transforms of `schema` to `record`, then revalidates
/// every field. `path` is empty for the root record.
///
/// A schema without struct transforms skips revalidation: its fields were
/// already coerced and constraint-checked, and nested records revalidate
/// through their own schema's call.
pub(crate) fn apply_struct(schema: &Schema, record: &mut Record, path: &str) -> Result<()> {
    let scope = if path.is_empty() { schema.name() } else { path };
    for transform in schema.struct_transforms() {
        trace!("struct transform '{}' on {scope}", transform.name());
        transform.func().call(schema, record).map_err(|err| {
            wrap_failure(err, |reason, source| Error::Transform {
                field: scope.to_string(),
                mode: TransformMode::Struct,
                transform_name: transform.name().to_string(),
                target_type: schema.name().to_string(),
                value: Some(record.to_json().to_string()),
                reason,
                source,
            })
        })?;
    }
    if schema.struct_transforms().is_empty() {
        return Ok(());
    }
    revalidate(schema, record, path)
}

/// Checks every field of `record` for type compatibility and constraints,
/// descending into nested records.
pub(crate) fn revalidate(schema: &Schema, record: &Record, path: &str) -> Result<()> {
    for field in schema.fields() {
        let current_path = if path.is_empty() {
            field.name().to_string()
        } else {
            format!("{path}.{}", field.name())
        };
        let value = record.get(field.name()).unwrap_or(&Value::Null);

        if !is_compatible(value, field.ty()) {
            return Err(Error::Transform {
                field: current_path,
                mode: TransformMode::Struct,
                transform_name: "<struct-transform-chain>".to_string(),
                target_type: field.ty().type_name(),
                value: Some(value.to_string()),
                reason: "transform_struct changed value to incompatible type".to_string(),
                source: None,
            });
        }
        ConstraintValidator::new(field.info()).validate(
            value,
            &current_path,
            &field.ty().type_name(),
            &value.to_string(),
        )?;

        if let (Some(nested), Value::Record(inner)) = (field.ty().nested_schema(), value) {
            let nested = nested.get();
            if inner.schema_name() == nested.name() {
                revalidate(nested, inner, &current_path)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumSpec, Field, FieldInfo};
    use crate::transform::StructTransform;
    use crate::value::{EnumValue, Number};

    fn schema_with(transforms: Vec<FieldTransform>) -> Schema {
        transforms
            .into_iter()
            .fold(
                Schema::builder("App")
                    .field(Field::new("name", FieldType::Str))
                    .field(Field::new("count", FieldType::Int).gt(0)),
                |builder, transform| builder.transform(transform),
            )
            .build()
            .unwrap()
    }

    fn upper(value: Value) -> std::result::Result<Value, BoxError> {
        Ok(Value::Str(value.as_str().unwrap_or_default().to_uppercase()))
    }

    #[test]
    fn test_compatibility_rules() {
        let level = EnumSpec::new("Level", [("A", "a")]);
        let member = Value::Enum(EnumValue {
            enum_name: "Level".into(),
            member: "A".into(),
            value: "a".into(),
        });
        assert!(is_compatible(&member, &FieldType::Enum(level)));
        assert!(!is_compatible(&Value::Int(1), &FieldType::Float));
        assert!(!is_compatible(&Value::Bool(true), &FieldType::Int));
        assert!(is_compatible(&Value::Set(vec![]), &FieldType::set(FieldType::Str)));
        assert!(!is_compatible(&Value::List(vec![]), &FieldType::set(FieldType::Str)));
        assert!(is_compatible(&Value::Null, &FieldType::Any));
        assert!(is_compatible(&Value::Null, &FieldType::Null));
    }

    #[test]
    fn test_before_chain_runs_in_order() {
        let schema = schema_with(vec![
            FieldTransform::before("upper", "name", upper),
            FieldTransform::before("suffix", "name", |value: Value| {
                Ok(Value::Str(format!("{}!", value.as_str().unwrap_or_default())))
            }),
        ]);
        let field = schema.field("name").unwrap();
        let value = apply_before(&schema, field, "name", Value::from("abc")).unwrap();
        assert_eq!(value, Value::from("ABC!"));
    }

    #[test]
    fn test_after_incompatible_names_transform() {
        let schema = schema_with(vec![FieldTransform::after("stringify", "count", |value: Value| {
            Ok(Value::Str(value.to_string()))
        })]);
        let field = schema.field("count").unwrap();
        match apply_after(&schema, field, "count", Value::Int(3)).unwrap_err() {
            Error::Transform {
                transform_name,
                mode,
                reason,
                value,
                ..
            } => {
                assert_eq!(transform_name, "stringify");
                assert_eq!(mode, TransformMode::After);
                assert_eq!(reason, "after transform changed value to incompatible type");
                assert_eq!(value.as_deref(), Some("\"3\""));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_transform_failure_is_wrapped() {
        let schema = schema_with(vec![FieldTransform::before("boom", "name", |_: Value| {
            Err("exploded".into())
        })]);
        let field = schema.field("name").unwrap();
        let err = apply_before(&schema, field, "name", Value::from("x")).unwrap_err();
        match &err {
            Error::Transform {
                field,
                reason,
                mode,
                ..
            } => {
                assert_eq!(field, "name");
                assert_eq!(reason, "exploded");
                assert_eq!(*mode, TransformMode::Before);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_inner_transform_error_is_reraised() {
        let schema = schema_with(vec![FieldTransform::before("inner", "name", |_: Value| {
            Err(Box::new(Error::Transform {
                field: "custom".into(),
                mode: TransformMode::Before,
                transform_name: "custom".into(),
                target_type: "str".into(),
                value: None,
                reason: "custom failure".into(),
                source: None,
            }) as BoxError)
        })]);
        let field = schema.field("name").unwrap();
        match apply_before(&schema, field, "name", Value::from("x")).unwrap_err() {
            Error::Transform { transform_name, .. } => assert_eq!(transform_name, "custom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_struct_transform_then_revalidate() {
        let schema = Schema::builder("App")
            .field(Field::new("count", FieldType::Int).gt(0))
            .struct_transform(StructTransform::new("zero", |record| {
                record.set("count", Value::Int(0))?;
                Ok(())
            }))
            .build()
            .unwrap();
        let mut record = Record::new("App");
        record.insert("count", Value::Int(5));
        let err = apply_struct(&schema, &mut record, "").unwrap_err();
        assert!(err.is_parse(), "{err}");
        assert!(err.to_string().contains("'count'"));
    }

    #[test]
    fn test_no_struct_transforms_leaves_record_alone() {
        let schema = Schema::builder("App")
            .field(Field::new("count", FieldType::Int).gt(0))
            .build()
            .unwrap();
        let mut record = Record::new("App");
        record.insert("count", Value::Int(7));
        apply_struct(&schema, &mut record, "").unwrap();
        assert_eq!(record.get("count"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_struct_transform_incompatible_type() {
        let schema = Schema::builder("App")
            .field(Field::new("count", FieldType::Int))
            .struct_transform(StructTransform::new("stringify", |record| {
                record.set("count", Value::from("three"))?;
                Ok(())
            }))
            .build()
            .unwrap();
        let mut record = Record::new("App");
        record.insert("count", Value::Int(3));
        match apply_struct(&schema, &mut record, "").unwrap_err() {
            Error::Transform {
                field,
                transform_name,
                reason,
                ..
            } => {
                assert_eq!(field, "count");
                assert_eq!(transform_name, "<struct-transform-chain>");
                assert_eq!(reason, "transform_struct changed value to incompatible type");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_struct_transform_failure_scoped_to_schema_name() {
        let schema = Schema::builder("App")
            .field(Field::new("count", FieldType::Int))
            .struct_transform(StructTransform::new("fail", |_| Err("nope".into())))
            .build()
            .unwrap();
        let mut record = Record::new("App");
        record.insert("count", Value::Int(3));
        match apply_struct(&schema, &mut record, "").unwrap_err() {
            Error::Transform { field, mode, .. } => {
                assert_eq!(field, "App");
                assert_eq!(mode, TransformMode::Struct);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_revalidate_checks_constraints_recursively() {
        let inner = std::sync::Arc::new(
            Schema::builder("Inner")
                .field(Field::new("size", FieldType::Int).info(FieldInfo {
                    le: Some(Number::Int(10)),
                    ..FieldInfo::new()
                }))
                .build()
                .unwrap(),
        );
        let outer = Schema::builder("Outer")
            .field(Field::new("inner", FieldType::shared(inner)))
            .build()
            .unwrap();
        let mut nested = Record::new("Inner");
        nested.insert("size", Value::Int(11));
        let mut record = Record::new("Outer");
        record.insert("inner", Value::Record(nested));

        let err = revalidate(&outer, &record, "").unwrap_err();
        match err {
            Error::Parse { field, .. } => assert_eq!(field, "inner.size"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
