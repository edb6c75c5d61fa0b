//! Integration tests for alias lookup and key casing.

mod common;

use common::{env, env_file};
use strictenv::{Error, Field, FieldType, Schema, SettingsConfig, SettingsLoader, Value};

fn schema(config: SettingsConfig) -> Schema {
    Schema::builder("Service")
        .config(config)
        .field(Field::new("apiKey", FieldType::Str).alias("API_TOKEN"))
        .field(Field::new("region", FieldType::Str).default("eu"))
        .build()
        .unwrap()
}

#[test]
fn test_alias_preferred_over_field_name() {
    let schema = schema(SettingsConfig::default());
    let record = SettingsLoader::new(&schema)
        .with_env(env(&[("APIKEY", "by-name"), ("API_TOKEN", "by-alias")]))
        .load_record()
        .unwrap();
    assert_eq!(record.get("apiKey"), Some(&Value::from("by-alias")));
}

#[test]
fn test_field_name_is_a_fallback_for_aliased_fields() {
    let schema = schema(SettingsConfig::default());
    let record = SettingsLoader::new(&schema)
        .with_env(env(&[("apikey", "by-name")]))
        .load_record()
        .unwrap();
    assert_eq!(record.get("apiKey"), Some(&Value::from("by-name")));
}

#[test]
fn test_case_insensitive_matching_with_prefix() {
    let schema = schema(SettingsConfig {
        env_prefix: "svc_".into(),
        ..SettingsConfig::default()
    });
    let record = SettingsLoader::new(&schema)
        .with_env(env(&[("Svc_Api_Token", "t"), ("svc_region", "us")]))
        .load_record()
        .unwrap();
    assert_eq!(record.get("apiKey"), Some(&Value::from("t")));
    assert_eq!(record.get("region"), Some(&Value::from("us")));
}

#[test]
fn test_case_sensitive_requires_exact_keys() {
    let config = SettingsConfig {
        env_prefix: "Svc_".into(),
        case_sensitive: true,
        ..SettingsConfig::default()
    };
    let schema = schema(config);

    let record = SettingsLoader::new(&schema)
        .with_env(env(&[("Svc_API_TOKEN", "t"), ("Svc_region", "us")]))
        .load_record()
        .unwrap();
    assert_eq!(record.get("region"), Some(&Value::from("us")));

    let record = SettingsLoader::new(&schema)
        .with_env(env(&[("Svc_API_TOKEN", "t"), ("SVC_REGION", "us")]))
        .load_record()
        .unwrap();
    assert_eq!(record.get("region"), Some(&Value::from("eu")));

    match SettingsLoader::new(&schema)
        .with_env(env(&[("svc_api_token", "t")]))
        .load_record()
    {
        Err(Error::MissingSetting { env_key, .. }) => assert_eq!(env_key, "Svc_API_TOKEN"),
        other => panic!("expected missing setting, got {other:?}"),
    }
}

#[test]
fn test_case_sensitive_allows_differently_cased_keys() {
    let (_dir, path) = env_file("region=file\n");
    let schema = schema(SettingsConfig {
        case_sensitive: true,
        env_file: Some(path),
        ..SettingsConfig::default()
    });
    let record = SettingsLoader::new(&schema)
        .with_env(env(&[("API_TOKEN", "t"), ("REGION", "runtime")]))
        .load_record()
        .unwrap();
    assert_eq!(record.get("region"), Some(&Value::from("file")));
}

#[test]
fn test_lenient_mode_tolerates_case_collisions() {
    let schema = schema(SettingsConfig {
        strict_env_file: false,
        ..SettingsConfig::default()
    });
    let record = SettingsLoader::new(&schema)
        .with_env(env(&[("API_TOKEN", "t"), ("region", "first"), ("REGION", "second")]))
        .load_record()
        .unwrap();
    assert_eq!(record.get("region"), Some(&Value::from("second")));
}
