//! YAML schema documents.
//!
//! A schema document describes settings schemas without Rust code, so
//! tools such as the `strictenv` CLI can load arbitrary settings:
//!
//! ```yaml
//! config:
//!   env_prefix: APP_
//!   env_nested_delimiter: "__"
//! enums:
//!   - name: Level
//!     members: [debug, info, {name: WARN, value: warning}]
//! schemas:
//!   - name: App
//!     fields:
//!       - {name: debug, type: bool, default: false}
//!       - {name: level, type: Level, default: info}
//!       - {name: database, type: Database, description: Database settings}
//!   - name: Database
//!     fields:
//!       - {name: host, type: str}
//!       - {name: port, type: int, default: 5432, gt: 0}
//! ```
//!
//! Type expressions use `str`, `int`, `float`, `bool`, `any`, `date`,
//! `time`, `datetime`, `duration`, `none`, `list[T]`, `set[T]`,
//! `dict[str, T]`, `tuple[T, ...]`, `optional[T]`, unions written `T | U`,
//! and the names of declared enums and schemas. The root schema is `root`
//! if given, else the first schema; the document `config` is attached to
//! it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::{EnumSpec, Field, FieldInfo, FieldType, Schema, SettingsConfig};
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentSpec {
    #[serde(default)]
    config: Option<SettingsConfig>,
    #[serde(default)]
    root: Option<String>,
    #[serde(default)]
    enums: Vec<EnumDoc>,
    schemas: Vec<SchemaDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnumDoc {
    name: String,
    members: Vec<MemberDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MemberDoc {
    Plain(String),
    Pair { name: String, value: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDoc {
    name: String,
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    fields: Vec<FieldDoc>,
}

#[derive(Debug, Deserialize)]
struct FieldDoc {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(flatten)]
    info: FieldInfo,
}

/// Schemas built from a YAML document.
///
/// # Examples
///
/// ```
/// use strictenv::SchemaDocument;
///
/// let yaml = r#"
/// config: {env_prefix: APP_}
/// schemas:
///   - name: App
///     fields:
///       - {name: port, type: int, default: 8000}
///       - {name: tags, type: "list[str] | none", default: null}
/// "#;
/// let document = SchemaDocument::from_yaml(yaml).unwrap();
/// assert_eq!(document.root().name(), "App");
/// assert_eq!(document.root().config().unwrap().env_prefix, "APP_");
/// assert_eq!(document.root().field("tags").unwrap().ty().type_name(), "list[str] | None");
/// ```
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    root: Arc<Schema>,
    schemas: HashMap<String, Arc<Schema>>,
}

impl SchemaDocument {
    /// Parses and builds a document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaDocument`] for malformed YAML and
    /// [`Error::Config`] for unknown or recursive type references, bad type
    /// expressions and invalid field metadata.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let spec: DocumentSpec = serde_yaml::from_str(yaml)?;
        DocumentBuilder::new(spec)?.build()
    }

    /// Reads and builds a document from a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, plus everything
    /// [`from_yaml`](Self::from_yaml) returns.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// The root schema, carrying the document configuration.
    #[must_use]
    pub fn root(&self) -> &Schema {
        &self.root
    }

    /// Shared handle to the root schema.
    #[must_use]
    pub fn root_shared(&self) -> Arc<Schema> {
        Arc::clone(&self.root)
    }

    /// Any declared schema by name.
    #[must_use]
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name).map(AsRef::as_ref)
    }
}

struct DocumentBuilder {
    config: Option<SettingsConfig>,
    root: String,
    enums: HashMap<String, EnumSpec>,
    specs: HashMap<String, SchemaDoc>,
    built: HashMap<String, Arc<Schema>>,
    building: Vec<String>,
}

impl DocumentBuilder {
    fn new(spec: DocumentSpec) -> Result<Self> {
        let root = match spec.root {
            Some(root) => root,
            None => spec
                .schemas
                .first()
                .map(|schema| schema.name.clone())
                .ok_or_else(|| Error::config("schema document declares no schemas"))?,
        };

        let mut enums = HashMap::new();
        for doc in spec.enums {
            let members: Vec<(String, String)> = doc
                .members
                .into_iter()
                .map(|member| match member {
                    MemberDoc::Plain(value) => (value.clone(), value),
                    MemberDoc::Pair { name, value } => (name, value),
                })
                .collect();
            if members.is_empty() {
                return Err(Error::config(format!("enum {} has no members", doc.name)));
            }
            let name = doc.name.clone();
            if enums.insert(name.clone(), EnumSpec::new(doc.name, members)).is_some() {
                return Err(Error::config(format!("duplicate enum '{name}'")));
            }
        }

        let mut specs = HashMap::new();
        for doc in spec.schemas {
            if enums.contains_key(&doc.name) || is_builtin(&doc.name) {
                return Err(Error::config(format!(
                    "schema name '{}' shadows another type",
                    doc.name
                )));
            }
            let name = doc.name.clone();
            if specs.insert(name.clone(), doc).is_some() {
                return Err(Error::config(format!("duplicate schema '{name}'")));
            }
        }
        if !specs.contains_key(&root) {
            return Err(Error::config(format!("root schema '{root}' is not declared")));
        }

        Ok(Self {
            config: spec.config,
            root,
            enums,
            specs,
            built: HashMap::new(),
            building: Vec::new(),
        })
    }

    fn build(mut self) -> Result<SchemaDocument> {
        let names: Vec<String> = self.specs.keys().cloned().collect();
        for name in &names {
            self.schema(name)?;
        }
        let root = self
            .built
            .get(&self.root)
            .cloned()
            .ok_or_else(|| Error::config(format!("root schema '{}' is not declared", self.root)))?;
        Ok(SchemaDocument {
            root,
            schemas: self.built,
        })
    }

    fn schema(&mut self, name: &str) -> Result<Arc<Schema>> {
        if let Some(schema) = self.built.get(name) {
            return Ok(Arc::clone(schema));
        }
        if self.building.iter().any(|pending| pending == name) {
            let mut chain = self.building.clone();
            chain.push(name.to_string());
            return Err(Error::config(format!(
                "recursive schema reference: {}",
                chain.join(" -> ")
            )));
        }
        let doc = self
            .specs
            .remove(name)
            .ok_or_else(|| Error::config(format!("unknown type '{name}'")))?;

        self.building.push(name.to_string());
        let result = self.assemble(&doc);
        self.building.pop();
        self.specs.insert(name.to_string(), doc);

        let schema = Arc::new(result?);
        self.built.insert(name.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    fn assemble(&mut self, doc: &SchemaDoc) -> Result<Schema> {
        let mut builder = Schema::builder(doc.name.clone());
        if let Some(parent) = &doc.extends {
            let parent = self.schema(parent)?;
            builder = builder.extends(&parent);
        }
        if doc.name == self.root {
            if let Some(config) = &self.config {
                builder = builder.config(config.clone());
            }
        }
        for field in &doc.fields {
            let ty = self.parse_type(field.ty.trim()).map_err(|err| match err {
                Error::Config { message } => Error::config(format!(
                    "schema {}, field '{}': {message}",
                    doc.name, field.name
                )),
                other => other,
            })?;
            builder = builder.field(Field::new(field.name.clone(), ty).info(field.info.clone()));
        }
        builder.build()
    }

    fn parse_type(&mut self, expr: &str) -> Result<FieldType> {
        let members = split_top_level(expr, '|')?;
        if members.len() > 1 {
            return members
                .iter()
                .map(|member| self.parse_type(member.trim()))
                .collect::<Result<Vec<_>>>()
                .map(FieldType::Union);
        }

        let (head, args) = match expr.split_once('[') {
            Some((head, rest)) => {
                let inner = rest
                    .strip_suffix(']')
                    .ok_or_else(|| Error::config(format!("unbalanced brackets in '{expr}'")))?;
                (head.trim(), Some(split_top_level(inner, ',')?))
            }
            None => (expr, None),
        };

        let args = args.unwrap_or_default();
        let arity = |expected: usize| -> Result<()> {
            if args.len() == expected {
                Ok(())
            } else {
                Err(Error::config(format!(
                    "'{head}' takes {expected} type argument(s), got {} in '{expr}'",
                    args.len()
                )))
            }
        };

        match head.to_lowercase().as_str() {
            "list" => {
                arity(1)?;
                Ok(FieldType::list(self.parse_type(args[0].trim())?))
            }
            "set" => {
                arity(1)?;
                Ok(FieldType::set(self.parse_type(args[0].trim())?))
            }
            "optional" => {
                arity(1)?;
                Ok(FieldType::optional(self.parse_type(args[0].trim())?))
            }
            "dict" | "map" => {
                let value = match args.as_slice() {
                    [value] => value,
                    [key, value] if key.trim() == "str" => value,
                    _ => {
                        return Err(Error::config(format!(
                            "'{head}' takes string keys and one value type, got '{expr}'"
                        )))
                    }
                };
                Ok(FieldType::map(self.parse_type(value.trim())?))
            }
            "tuple" => {
                if args.is_empty() {
                    return Err(Error::config(format!("empty tuple type '{expr}'")));
                }
                args.iter()
                    .map(|arg| self.parse_type(arg.trim()))
                    .collect::<Result<Vec<_>>>()
                    .map(FieldType::Tuple)
            }
            _ if !args.is_empty() => Err(Error::config(format!(
                "'{head}' does not take type arguments"
            ))),
            "str" | "string" => Ok(FieldType::Str),
            "int" | "integer" => Ok(FieldType::Int),
            "float" => Ok(FieldType::Float),
            "bool" | "boolean" => Ok(FieldType::Bool),
            "any" => Ok(FieldType::Any),
            "date" => Ok(FieldType::Date),
            "time" => Ok(FieldType::Time),
            "datetime" => Ok(FieldType::DateTime),
            "duration" | "timedelta" => Ok(FieldType::Duration),
            "none" | "null" => Ok(FieldType::Null),
            _ => {
                if let Some(spec) = self.enums.get(head) {
                    return Ok(FieldType::Enum(spec.clone()));
                }
                if head.is_empty() {
                    return Err(Error::config("empty type expression"));
                }
                let schema = self.schema(head)?;
                Ok(FieldType::shared(schema))
            }
        }
    }
}

fn is_builtin(name: &str) -> bool {
    matches!(
        name.to_lowercase().as_str(),
        "list" | "set" | "optional" | "dict" | "map" | "tuple" | "str" | "string" | "int"
            | "integer" | "float" | "bool" | "boolean" | "any" | "date" | "time" | "datetime"
            | "duration" | "timedelta" | "none" | "null"
    )
}

// Splits on `separator` outside of brackets.
fn split_top_level(expr: &str, separator: char) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (offset, c) in expr.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::config(format!("unbalanced brackets in '{expr}'")))?;
            }
            c if c == separator && depth == 0 => {
                parts.push(&expr[start..offset]);
                start = offset + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::config(format!("unbalanced brackets in '{expr}'")));
    }
    parts.push(&expr[start..]);
    Ok(parts)
}
