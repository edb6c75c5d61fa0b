//! Schema descriptor tables.
//!
//! A [`Schema`] is the explicit, build-once description of a settings type:
//! its ordered fields (name, [`FieldType`], merged [`FieldInfo`]), the
//! optional loader [`SettingsConfig`], and its composed transforms. The
//! resolution engine only ever consumes this table.
//!
//! # Examples
//!
//! ```
//! use strictenv::{Field, FieldType, Schema, SettingsConfig};
//!
//! let database = Schema::builder("Database")
//!     .field(Field::new("host", FieldType::Str).default("localhost"))
//!     .field(Field::new("port", FieldType::Int).default(5432).gt(0))
//!     .build()
//!     .unwrap();
//!
//! let app = Schema::builder("App")
//!     .config(SettingsConfig {
//!         env_prefix: "APP_".into(),
//!         env_nested_delimiter: Some("__".into()),
//!         ..SettingsConfig::default()
//!     })
//!     .field(Field::new("debug", FieldType::Bool))
//!     .field(Field::new("database", FieldType::shared(database.into())))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(app.fields().len(), 2);
//! assert!(app.field("database").unwrap().ty().nested_schema().is_some());
//! ```

pub mod config;
pub mod document;
pub mod field;
pub mod types;

pub use config::SettingsConfig;
pub use document::SchemaDocument;
pub use field::{Field, FieldDef, FieldInfo};
pub use types::{EnumMember, EnumSpec, FieldType, SchemaRef};

use crate::error::{Error, Result, TransformMode};
use crate::transform::{
    compose_struct_transforms, FieldTransform, StructTransform, TransformRegistry,
};

/// Types that expose a process-wide schema.
///
/// Implementations usually keep the schema in a `static OnceLock<Schema>`.
pub trait HasSchema {
    /// The schema describing `Self`.
    fn schema() -> &'static Schema;
}

/// A built schema.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDef>,
    config: Option<SettingsConfig>,
    transforms: TransformRegistry,
    struct_transforms: Vec<StructTransform>,
}

impl Schema {
    /// Starts declaring a schema.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order, inherited fields first.
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Looks up a field by exact name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Loader configuration, if declared.
    #[must_use]
    pub fn config(&self) -> Option<&SettingsConfig> {
        self.config.as_ref()
    }

    /// Field transforms.
    #[must_use]
    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }

    /// Struct transforms, in application order.
    #[must_use]
    pub fn struct_transforms(&self) -> &[StructTransform] {
        &self.struct_transforms
    }

    /// Resolves one environment path segment to a field: by name first,
    /// then by alias.
    #[must_use]
    pub fn match_field(&self, segment: &str, case_sensitive: bool) -> Option<&FieldDef> {
        let same = |candidate: &str| {
            if case_sensitive {
                candidate == segment
            } else {
                candidate.to_lowercase() == segment.to_lowercase()
            }
        };
        self.fields
            .iter()
            .find(|field| same(field.name()))
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|field| field.alias().is_some_and(same))
            })
    }
}

/// Builder for [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    inherited_fields: Vec<FieldDef>,
    inherited_transforms: TransformRegistry,
    inherited_struct_transforms: Vec<StructTransform>,
    fields: Vec<Field>,
    config: Option<SettingsConfig>,
    transforms: Vec<FieldTransform>,
    struct_transforms: Vec<StructTransform>,
}

impl SchemaBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inherited_fields: Vec::new(),
            inherited_transforms: TransformRegistry::default(),
            inherited_struct_transforms: Vec::new(),
            fields: Vec::new(),
            config: None,
            transforms: Vec::new(),
            struct_transforms: Vec::new(),
        }
    }

    /// Inherits fields, configuration and transforms from `parent`.
    ///
    /// Fields redeclared later replace the inherited declaration in place.
    #[must_use]
    pub fn extends(mut self, parent: &Schema) -> Self {
        self.inherited_fields = parent.fields.clone();
        self.inherited_transforms = parent.transforms.clone();
        self.inherited_struct_transforms = parent.struct_transforms.clone();
        if self.config.is_none() {
            self.config = parent.config.clone();
        }
        self
    }

    /// Declares a field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets the loader configuration.
    #[must_use]
    pub fn config(mut self, config: SettingsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Registers a field transform.
    #[must_use]
    pub fn transform(mut self, transform: FieldTransform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Registers a struct transform.
    #[must_use]
    pub fn struct_transform(mut self, transform: StructTransform) -> Self {
        self.struct_transforms.push(transform);
        self
    }

    /// Resolves field metadata and composes transforms.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid or duplicate field declarations
    /// and [`Error::Transform`] for a transform bound to an empty, dotted or
    /// undeclared field name.
    pub fn build(self) -> Result<Schema> {
        let mut fields = self.inherited_fields;
        let mut declared: Vec<String> = Vec::new();
        for field in self.fields {
            if field.name().is_empty() {
                return Err(Error::config(format!(
                    "schema {}: field name cannot be empty",
                    self.name
                )));
            }
            if declared.iter().any(|name| name == field.name()) {
                return Err(Error::config(format!(
                    "schema {}: duplicate field '{}'",
                    self.name,
                    field.name()
                )));
            }
            declared.push(field.name().to_string());

            let def = field.resolve()?;
            match fields.iter_mut().find(|existing| existing.name() == def.name()) {
                Some(existing) => *existing = def,
                None => fields.push(def),
            }
        }

        for transform in &self.transforms {
            check_transform_binding(transform, &fields)?;
        }
        if let Some(unnamed) = self.struct_transforms.iter().find(|t| t.name().is_empty()) {
            return Err(Error::Transform {
                field: self.name.clone(),
                mode: TransformMode::Struct,
                transform_name: unnamed.name().to_string(),
                target_type: self.name.clone(),
                value: None,
                reason: "struct transform name must be a non-empty string".to_string(),
                source: None,
            });
        }

        let transforms = TransformRegistry::compose(&self.inherited_transforms, self.transforms);
        let struct_transforms =
            compose_struct_transforms(&self.inherited_struct_transforms, self.struct_transforms);

        Ok(Schema {
            name: self.name,
            fields,
            config: self.config,
            transforms,
            struct_transforms,
        })
    }
}

fn check_transform_binding(transform: &FieldTransform, fields: &[FieldDef]) -> Result<()> {
    let reason = if transform.name().is_empty() {
        "transform name must be a non-empty string"
    } else if transform.field().is_empty() {
        "transform field_name must be a non-empty string"
    } else if transform.field().contains('.') {
        "transform field_name must be top-level (no dotted paths)"
    } else if !fields.iter().any(|field| field.name() == transform.field()) {
        "transform field is not declared in schema"
    } else {
        return Ok(());
    };
    Err(Error::Transform {
        field: transform.field().to_string(),
        mode: transform.mode(),
        transform_name: transform.name().to_string(),
        target_type: "any".to_string(),
        value: None,
        reason: reason.to_string(),
        source: None,
    })
}
