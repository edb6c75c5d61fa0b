//! Integration tests for projecting delimited keys onto nested schemas.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use common::env;
use strictenv::{EnvMap, Error, Field, FieldType, Schema, SettingsConfig, SettingsLoader, Value};

fn credentials() -> Arc<Schema> {
    Arc::new(
        Schema::builder("Credentials")
            .field(Field::new("user", FieldType::Str))
            .field(Field::new("password", FieldType::Str).alias("PASS").default(""))
            .build()
            .unwrap(),
    )
}

fn database() -> Arc<Schema> {
    Arc::new(
        Schema::builder("Database")
            .field(Field::new("host", FieldType::Str).default("localhost"))
            .field(Field::new("port", FieldType::Int).default(5432))
            .field(Field::new("auth", FieldType::shared(credentials())))
            .build()
            .unwrap(),
    )
}

fn app(max_depth: Option<i64>) -> Schema {
    Schema::builder("App")
        .config(SettingsConfig {
            env_prefix: "APP_".into(),
            env_nested_delimiter: Some("__".into()),
            max_nested_struct_depth: max_depth,
            ..SettingsConfig::default()
        })
        .field(Field::new("name", FieldType::Str).default("app"))
        .field(Field::new("database", FieldType::shared(database())))
        .build()
        .unwrap()
}

fn nested<'a>(record: &'a Value, field: &str) -> &'a Value {
    record.as_record().unwrap().get(field).unwrap()
}

#[test]
fn test_two_and_three_levels() {
    let schema = app(None);
    let record = SettingsLoader::new(&schema)
        .with_env(env(&[
            ("APP_DATABASE__PORT", "6543"),
            ("APP_DATABASE__AUTH__USER", "admin"),
            ("APP_DATABASE__AUTH__PASS", "secret"),
        ]))
        .load_record()
        .unwrap();

    let database = record.get("database").unwrap();
    assert_eq!(nested(database, "host"), &Value::from("localhost"));
    assert_eq!(nested(database, "port"), &Value::Int(6543));
    let auth = nested(database, "auth");
    assert_eq!(nested(auth, "user"), &Value::from("admin"));
    assert_eq!(nested(auth, "password"), &Value::from("secret"));
}

#[test]
fn test_keys_are_case_insensitive_by_default() {
    let schema = app(None);
    let record = SettingsLoader::new(&schema)
        .with_env(env(&[("app_database__auth__user", "lower")]))
        .load_record()
        .unwrap();
    let auth = nested(record.get("database").unwrap(), "auth");
    assert_eq!(nested(auth, "user"), &Value::from("lower"));
}

#[test]
fn test_unknown_segments_are_ignored() {
    let schema = app(None);
    let record = SettingsLoader::new(&schema)
        .with_env(env(&[
            ("APP_DATABASE__AUTH__USER", "admin"),
            ("APP_DATABASE__REPLICA__HOST", "ignored"),
            ("APP_CACHE__SIZE", "ignored"),
            ("APP_DATABASE__", "ignored"),
            ("OTHER_DATABASE__PORT", "1"),
        ]))
        .load_record()
        .unwrap();
    let database = record.get("database").unwrap();
    assert_eq!(nested(database, "port"), &Value::Int(5432));
    assert!(database.as_record().unwrap().get("replica").is_none());
}

#[test]
fn test_missing_nested_required_field() {
    let schema = app(None);
    let err = SettingsLoader::new(&schema)
        .with_env(env(&[("APP_DATABASE__PORT", "1")]))
        .load_record()
        .unwrap_err();
    match err {
        Error::Parse { field, target_type, .. } => {
            assert_eq!(field, "database");
            assert_eq!(target_type, "Database");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_nested_json_value_and_projection_merge() {
    let schema = app(None);
    let record = SettingsLoader::new(&schema)
        .with_env(env(&[("APP_DATABASE", r#"{"host": "db", "auth": {"user": "json"}}"#)]))
        .load_record()
        .unwrap();
    let database = record.get("database").unwrap();
    assert_eq!(nested(database, "host"), &Value::from("db"));
    assert_eq!(nested(nested(database, "auth"), "user"), &Value::from("json"));

    // Projected keys take precedence over a whole-object value.
    let record = SettingsLoader::new(&schema)
        .with_env(env(&[
            ("APP_DATABASE", r#"{"host": "db", "auth": {"user": "json"}}"#),
            ("APP_DATABASE__AUTH__USER", "delimited"),
        ]))
        .load_record()
        .unwrap();
    let auth = nested(record.get("database").unwrap(), "auth");
    assert_eq!(nested(auth, "user"), &Value::from("delimited"));
}

#[test]
fn test_without_delimiter_keys_are_not_projected() {
    let mut schema_config = app(None).config().cloned().unwrap();
    schema_config.env_nested_delimiter = None;
    let schema = app(None);
    let err = SettingsLoader::new(&schema)
        .with_config(schema_config)
        .with_env(env(&[("APP_DATABASE__AUTH__USER", "admin")]))
        .load_record()
        .unwrap_err();
    assert!(matches!(err, Error::MissingSetting { ref field_name, .. } if field_name == "database"));
}

// ============================================================================
// Depth limit
// ============================================================================

#[test]
fn test_depth_limit_on_delimited_keys() {
    let schema = app(Some(1));
    let err = SettingsLoader::new(&schema)
        .with_env(env(&[("APP_DATABASE__AUTH__USER", "admin")]))
        .load_record()
        .unwrap_err();
    match err {
        Error::NestedDepth {
            field_path,
            depth,
            max_depth,
        } => {
            assert_eq!(field_path, "database.auth");
            assert_eq!(depth, 2);
            assert_eq!(max_depth, 1);
        }
        other => panic!("expected depth error, got {other:?}"),
    }
}

#[test]
fn test_depth_limit_on_json_and_overrides() {
    let schema = app(Some(1));
    let err = SettingsLoader::new(&schema)
        .with_env(env(&[("APP_DATABASE", r#"{"auth": {"user": "u"}}"#)]))
        .load_record()
        .unwrap_err();
    assert!(err.is_nested_depth());

    let err = SettingsLoader::new(&schema)
        .with_env(EnvMap::new())
        .with_override("database", r#"{"auth": {"user": "u"}}"#)
        .load_record()
        .unwrap_err();
    assert!(err.is_nested_depth());

    let schema = app(Some(2));
    assert!(SettingsLoader::new(&schema)
        .with_env(env(&[("APP_DATABASE__AUTH__USER", "admin")]))
        .load_record()
        .is_ok());
}

#[test]
fn test_depth_limit_on_dictionary_override() {
    let auth = BTreeMap::from([("user".to_string(), Value::from("u"))]);
    let database = BTreeMap::from([("auth".to_string(), Value::Map(auth))]);

    let err = SettingsLoader::new(&app(Some(1)))
        .with_env(EnvMap::new())
        .with_override("database", Value::Map(database.clone()))
        .load_record()
        .unwrap_err();
    match err {
        Error::NestedDepth {
            field_path,
            depth,
            max_depth,
        } => {
            assert_eq!(field_path, "database.auth");
            assert_eq!(depth, 2);
            assert_eq!(max_depth, 1);
        }
        other => panic!("expected depth error, got {other:?}"),
    }

    let record = SettingsLoader::new(&app(Some(2)))
        .with_env(EnvMap::new())
        .with_override("database", Value::Map(database))
        .load_record()
        .unwrap();
    assert_eq!(record.to_json()["database"]["auth"]["user"], "u");
}

#[test]
fn test_invalid_depth_bound() {
    let schema = app(Some(0));
    let err = SettingsLoader::new(&schema).with_env(EnvMap::new()).load_record().unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}
