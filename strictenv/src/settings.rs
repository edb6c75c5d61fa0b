//! The [`Settings`] trait: typed entry points over a static schema.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::environment::EnvMap;
use crate::error::Result;
use crate::resolve::{render_env_example, write_env_example, SettingsLoader};
use crate::schema::HasSchema;

/// A settings type loaded from the environment.
///
/// Implemented for every deserializable type that exposes a schema through
/// [`HasSchema`]. The resolved record is handed to serde, so field names in
/// the schema must match the type's serde field names.
///
/// # Examples
///
/// ```
/// use std::sync::OnceLock;
///
/// use serde::Deserialize;
/// use strictenv::{EnvMap, Field, FieldType, HasSchema, Schema, Settings, SettingsConfig};
///
/// #[derive(Debug, Deserialize)]
/// struct AppSettings {
///     debug: bool,
///     port: i64,
/// }
///
/// impl HasSchema for AppSettings {
///     fn schema() -> &'static Schema {
///         static SCHEMA: OnceLock<Schema> = OnceLock::new();
///         SCHEMA.get_or_init(|| {
///             Schema::builder("AppSettings")
///                 .config(SettingsConfig { env_prefix: "APP_".into(), ..SettingsConfig::default() })
///                 .field(Field::new("debug", FieldType::Bool))
///                 .field(Field::new("port", FieldType::Int).default(8000))
///                 .build()
///                 .expect("valid schema")
///         })
///     }
/// }
///
/// let env: EnvMap = [("APP_DEBUG", "true")].into_iter().collect();
/// let settings = AppSettings::load_from(env).unwrap();
/// assert!(settings.debug);
/// assert_eq!(settings.port, 8000);
/// ```
pub trait Settings: HasSchema + DeserializeOwned {
    /// Loads from the process environment.
    ///
    /// # Errors
    ///
    /// See [`SettingsLoader::load_record`].
    fn load() -> Result<Self> {
        Self::loader().load()
    }

    /// Loads from an explicit environment instead of the process one.
    ///
    /// # Errors
    ///
    /// See [`SettingsLoader::load_record`].
    fn load_from(env: EnvMap) -> Result<Self> {
        Self::loader().with_env(env).load()
    }

    /// A loader for further customization (overrides, configuration).
    #[must_use]
    fn loader() -> SettingsLoader<'static> {
        SettingsLoader::new(Self::schema())
    }

    /// Renders an example `.env` document for this type.
    ///
    /// # Errors
    ///
    /// See [`render_env_example`].
    fn env_example() -> Result<String> {
        render_env_example(Self::schema())
    }

    /// Writes an example `.env` file for this type.
    ///
    /// # Errors
    ///
    /// See [`write_env_example`].
    fn write_env_example(path: &Path) -> Result<()> {
        write_env_example(Self::schema(), path)
    }
}

impl<T: HasSchema + DeserializeOwned> Settings for T {}
