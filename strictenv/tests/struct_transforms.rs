//! Integration tests for whole-record transforms.

mod common;

use std::sync::Arc;

use common::env;
use strictenv::{
    BoxError, Error, Field, FieldType, Record, Schema, SettingsConfig, SettingsLoader,
    StructTransform, TransformMode, Value,
};

fn tag(name: &'static str) -> impl Fn(&mut Record) -> Result<(), BoxError> + Send + Sync {
    move |record: &mut Record| {
        let trail = record.get("trail").and_then(Value::as_str).unwrap_or_default();
        let next = format!("{trail}{name};");
        record.set("trail", Value::from(next))?;
        Ok(())
    }
}

fn tracked(name: &str) -> strictenv::SchemaBuilder {
    Schema::builder(name).field(Field::new("trail", FieldType::Str).default(""))
}

#[test]
fn test_root_struct_transform_mutates_record() {
    let schema = Schema::builder("Endpoint")
        .field(Field::new("host", FieldType::Str))
        .field(Field::new("port", FieldType::Int).default(80))
        .field(Field::new("url", FieldType::optional(FieldType::Str)).default(Value::Null))
        .struct_transform(StructTransform::new("derive_url", |record: &mut Record| {
            let host = record.get("host").and_then(Value::as_str).unwrap_or_default();
            let port = record.get("port").and_then(Value::as_int).unwrap_or_default();
            let url = format!("http://{host}:{port}");
            record.set("url", Value::from(url))?;
            Ok(())
        }))
        .build()
        .unwrap();

    let record = SettingsLoader::new(&schema)
        .with_env(env(&[("HOST", "api")]))
        .load_record()
        .unwrap();
    assert_eq!(record.get("url"), Some(&Value::from("http://api:80")));
}

#[test]
fn test_nested_struct_transforms_run_before_parent() {
    let inner = Arc::new(
        tracked("Inner")
            .struct_transform(StructTransform::new("inner", tag("inner")))
            .build()
            .unwrap(),
    );
    let outer = tracked("Outer")
        .config(SettingsConfig {
            env_nested_delimiter: Some("__".into()),
            ..SettingsConfig::default()
        })
        .field(Field::new("child", FieldType::shared(inner)))
        .struct_transform(StructTransform::with_schema(
            "outer",
            |schema: &Schema, record: &mut Record| {
                let child_trail = record
                    .get("child")
                    .and_then(Value::as_record)
                    .and_then(|child| child.get("trail"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                record.set("trail", Value::from(format!("{}<{child_trail}>", schema.name())))?;
                Ok(())
            },
        ))
        .build()
        .unwrap();

    let record = SettingsLoader::new(&outer)
        .with_env(env(&[("CHILD__TRAIL", "start;")]))
        .load_record()
        .unwrap();
    assert_eq!(record.get("trail"), Some(&Value::from("Outer<start;inner;>")));
}

#[test]
fn test_struct_transform_type_change() {
    let schema = Schema::builder("Typed")
        .field(Field::new("port", FieldType::Int).default(1))
        .struct_transform(StructTransform::new("break_port", |record: &mut Record| {
            record.set("port", Value::from("eighty"))?;
            Ok(())
        }))
        .build()
        .unwrap();

    match SettingsLoader::new(&schema).with_env(env(&[])).load_record() {
        Err(Error::Transform {
            field,
            mode,
            transform_name,
            ..
        }) => {
            assert_eq!(field, "port");
            assert_eq!(mode, TransformMode::Struct);
            assert_eq!(transform_name, "<struct-transform-chain>");
        }
        other => panic!("expected transform error, got {other:?}"),
    }
}

#[test]
fn test_struct_transform_revalidates_constraints() {
    let schema = Schema::builder("Bounded")
        .field(Field::new("workers", FieldType::Int).gt(0).default(2))
        .struct_transform(StructTransform::new("zero", |record: &mut Record| {
            record.set("workers", Value::Int(0))?;
            Ok(())
        }))
        .build()
        .unwrap();

    let err = SettingsLoader::new(&schema).with_env(env(&[])).load_record().unwrap_err();
    assert!(matches!(err, Error::Parse { ref field, .. } if field == "workers"));
}

#[test]
fn test_struct_transform_failure() {
    let schema = Schema::builder("Failing")
        .field(Field::new("debug", FieldType::Bool).default(false))
        .struct_transform(StructTransform::new("refuse", |_: &mut Record| {
            Err("refusing to load".into())
        }))
        .build()
        .unwrap();

    match SettingsLoader::new(&schema).with_env(env(&[])).load_record() {
        Err(Error::Transform {
            field,
            transform_name,
            reason,
            ..
        }) => {
            assert_eq!(field, "Failing");
            assert_eq!(transform_name, "refuse");
            assert_eq!(reason, "refusing to load");
        }
        other => panic!("expected transform error, got {other:?}"),
    }
}

// ============================================================================
// Inheritance
// ============================================================================

#[test]
fn test_inherited_struct_transforms_run_parent_first() {
    let parent = tracked("Parent")
        .struct_transform(StructTransform::new("parent", tag("parent")))
        .build()
        .unwrap();
    let child = Schema::builder("Child")
        .extends(&parent)
        .struct_transform(StructTransform::new("child", tag("child")))
        .build()
        .unwrap();

    let record = SettingsLoader::new(&child).with_env(env(&[])).load_record().unwrap();
    assert_eq!(record.get("trail"), Some(&Value::from("parent;child;")));
}

#[test]
fn test_child_replaces_struct_transform_by_name() {
    let parent = tracked("Parent")
        .struct_transform(StructTransform::new("first", tag("a")))
        .struct_transform(StructTransform::new("second", tag("b")))
        .build()
        .unwrap();
    let child = Schema::builder("Child")
        .extends(&parent)
        .struct_transform(StructTransform::new("first", tag("c")))
        .build()
        .unwrap();

    let record = SettingsLoader::new(&child).with_env(env(&[])).load_record().unwrap();
    assert_eq!(record.get("trail"), Some(&Value::from("b;c;")));
}

#[test]
fn test_unnamed_struct_transform_rejected() {
    let result = tracked("Bad")
        .struct_transform(StructTransform::new("", tag("x")))
        .build();
    assert!(matches!(result, Err(Error::Transform { .. })));
}
