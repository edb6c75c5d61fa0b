#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # strictenv
//!
//! Typed application settings loaded from environment variables and `.env`
//! files.
//!
//! A settings type is described by an explicit [`Schema`]: its fields, their
//! [`FieldType`]s, defaults, aliases and constraints, plus optional field
//! and struct transforms. Loading merges an optional `.env` file beneath the
//! runtime environment, projects `PARENT__CHILD` keys onto nested schemas,
//! coerces every value strictly and reports the first failure as a precise
//! [`Error`].
//!
//! ## Core Types
//!
//! - [`Schema`], [`Field`] and [`FieldType`]: Schema declaration
//! - [`SettingsConfig`]: Prefix, casing, env file and nesting options
//! - [`SettingsLoader`] and [`Settings`]: Loading records and typed values
//! - [`FieldTransform`] and [`StructTransform`]: User hooks around coercion
//! - [`EnvMap`] and [`dotenv`]: Environment maps and the `.env` engine
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use strictenv::{EnvMap, Field, FieldType, Schema, SettingsConfig, SettingsLoader, Value};
//!
//! let schema = Schema::builder("App")
//!     .config(SettingsConfig {
//!         env_prefix: "APP_".into(),
//!         ..SettingsConfig::default()
//!     })
//!     .field(Field::new("workers", FieldType::Int).default(4).ge(1))
//!     .field(Field::new("hosts", FieldType::list(FieldType::Str)))
//!     .build()
//!     .unwrap();
//!
//! let env: EnvMap = [("APP_HOSTS", r#"["a", "b"]"#)].into_iter().collect();
//! let record = SettingsLoader::new(&schema).with_env(env).load_record().unwrap();
//! assert_eq!(record.get("workers"), Some(&Value::Int(4)));
//! assert_eq!(
//!     record.get("hosts"),
//!     Some(&Value::List(vec![Value::from("a"), Value::from("b")]))
//! );
//! ```

pub mod coerce;
pub mod dotenv;
pub mod environment;
pub mod error;
pub mod logging;
pub mod output;
pub mod resolve;
pub mod schema;
pub mod settings;
pub mod transform;
pub mod value;

// Re-export key types at crate root for convenience
pub use environment::{format_env_key, EnvMap, EnvironmentMerger};
pub use error::{BoxError, Error, Result, TransformMode};
pub use logging::{init_logger, LogLevel, Logger};
pub use resolve::{render_env_example, render_env_example_with, write_env_example, SettingsLoader};
pub use schema::{
    EnumMember, EnumSpec, Field, FieldDef, FieldInfo, FieldType, HasSchema, Schema, SchemaBuilder,
    SchemaDocument, SchemaRef, SettingsConfig,
};
pub use settings::Settings;
pub use transform::{is_compatible, FieldTransform, StructTransform, TransformRegistry};
pub use value::{EnumValue, Number, Record, Value};
