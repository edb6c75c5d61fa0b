//! Settings resolution.
//!
//! [`SettingsLoader`] ties the pieces together for one load of a root
//! schema:
//!
//! 1. Build the effective environment (env file beneath the runtime
//!    environment, keys normalized unless case-sensitive).
//! 2. Project delimited keys onto nested fields, then apply explicit
//!    overrides.
//! 3. Fill every still-missing field from its environment key (alias first)
//!    or its default; a field with neither is a missing setting.
//! 4. Coerce each field through its transform pipeline, build the root
//!    record and apply the root struct transforms.

mod example;
mod nested;
mod resolver;

pub use example::{render_env_example, render_env_example_with, write_env_example};

use std::collections::BTreeMap;

use log::{debug, info};
use serde::de::DeserializeOwned;

use crate::environment::{format_env_key, EnvMap, EnvironmentMerger};
use crate::error::{Error, Result};
use crate::schema::{FieldDef, Schema, SettingsConfig};
use crate::transform::pipeline::apply_struct;
use crate::value::{Record, Value};
use nested::NestedProjection;
use resolver::Resolver;

/// Fails when `depth` exceeds the configured bound.
pub(crate) fn ensure_depth(max_depth: Option<usize>, depth: usize, path: &str) -> Result<()> {
    match max_depth {
        Some(max_depth) if depth > max_depth => Err(Error::NestedDepth {
            field_path: path.to_string(),
            depth,
            max_depth,
        }),
        _ => Ok(()),
    }
}

/// Loads one root schema from the environment.
///
/// The loader configuration defaults to the schema's own
/// [`SettingsConfig`]. Without an explicit environment the live process
/// environment is read.
///
/// # Examples
///
/// ```
/// use strictenv::{EnvMap, Field, FieldType, Schema, SettingsConfig, SettingsLoader, Value};
///
/// let schema = Schema::builder("App")
///     .config(SettingsConfig { env_prefix: "APP_".into(), ..SettingsConfig::default() })
///     .field(Field::new("port", FieldType::Int).default(8000))
///     .field(Field::new("debug", FieldType::Bool))
///     .build()
///     .unwrap();
///
/// let env: EnvMap = [("APP_DEBUG", "yes")].into_iter().collect();
/// let record = SettingsLoader::new(&schema).with_env(env).load_record().unwrap();
/// assert_eq!(record.get("port"), Some(&Value::Int(8000)));
/// assert_eq!(record.get("debug"), Some(&Value::Bool(true)));
/// ```
#[derive(Debug, Clone)]
pub struct SettingsLoader<'a> {
    schema: &'a Schema,
    config: SettingsConfig,
    env: Option<EnvMap>,
    overrides: Vec<(String, Value)>,
}

impl<'a> SettingsLoader<'a> {
    /// Loader for `schema` using its declared configuration.
    #[must_use]
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            config: schema.config().cloned().unwrap_or_default(),
            env: None,
            overrides: Vec::new(),
        }
    }

    /// Replaces the loader configuration.
    #[must_use]
    pub fn with_config(mut self, config: SettingsConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses `env` instead of the process environment. An empty map means an
    /// empty environment.
    #[must_use]
    pub fn with_env(mut self, env: EnvMap) -> Self {
        self.env = Some(env);
        self
    }

    /// Supplies a field value directly, bypassing environment lookup.
    ///
    /// Strings still go through the full pipeline; other values are
    /// converted strictly. Names the schema does not declare are ignored.
    #[must_use]
    pub fn with_override(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.push((field.into(), value.into()));
        self
    }

    /// Supplies several overrides at once.
    #[must_use]
    pub fn with_overrides<K, V>(mut self, overrides: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.overrides
            .extend(overrides.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    /// The configuration this loader applies.
    #[must_use]
    pub fn config(&self) -> &SettingsConfig {
        &self.config
    }

    /// Resolves every field and returns the root record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid depth bound, env file and key
    /// collision errors in strict mode, [`Error::MissingSetting`],
    /// [`Error::Parse`], [`Error::NestedDepth`] and [`Error::Transform`].
    pub fn load_record(&self) -> Result<Record> {
        let config = &self.config;
        let max_depth = config.max_depth()?;
        let case_sensitive = config.case_sensitive;

        let env = EnvironmentMerger::build(
            self.env.as_ref(),
            config.env_file.as_deref(),
            case_sensitive,
            config.strict_env_file,
        )?;
        debug!("resolving {} from {} environment keys", self.schema.name(), env.len());

        let mut data: BTreeMap<String, Value> = BTreeMap::new();
        if let Some(delimiter) = config.nested_delimiter() {
            NestedProjection {
                prefix: &config.env_prefix,
                delimiter,
                case_sensitive,
                max_depth,
            }
            .apply(&env, self.schema, &mut data)?;
        }
        for (field, value) in &self.overrides {
            if self.schema.field(field).is_some() {
                data.insert(field.clone(), value.clone());
            } else {
                debug!("ignoring override for undeclared field '{field}'");
            }
        }

        let resolver = Resolver::new(max_depth);
        let mut record = Record::new(self.schema.name());
        for field in self.schema.fields() {
            let raw = match data.remove(field.name()) {
                Some(raw) => raw,
                None => self.lookup(&env, field)?,
            };
            let value = resolver.coerce_field(self.schema, field, raw, field.name(), 0)?;
            record.insert(field.name(), value);
        }

        apply_struct(self.schema, &mut record, "")?;
        info!("loaded settings {}", self.schema.name());
        Ok(record)
    }

    /// Resolves every field and deserializes the root record into `T`.
    ///
    /// # Errors
    ///
    /// Everything [`load_record`](Self::load_record) returns, plus
    /// [`Error::Parse`] if `T` rejects the resolved values.
    pub fn load<T: DeserializeOwned>(&self) -> Result<T> {
        self.load_record()?.deserialize(self.schema.name())
    }

    fn lookup(&self, env: &EnvMap, field: &FieldDef) -> Result<Value> {
        let prefix = &self.config.env_prefix;
        let case_sensitive = self.config.case_sensitive;

        for name in field.env_names() {
            let key = format_env_key(prefix, name, case_sensitive);
            if let Some(raw) = env.get(&key) {
                debug!("{} <- {key}", field.name());
                return Ok(Value::Str(raw.to_string()));
            }
        }
        if let Some(default) = field.default_value() {
            return Ok(default.clone());
        }
        Err(Error::MissingSetting {
            field_name: field.name().to_string(),
            env_key: format_env_key(prefix, field.primary_env_name(), case_sensitive),
        })
    }
}
