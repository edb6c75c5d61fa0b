//! Declared field types.

use std::fmt;
use std::sync::Arc;

use super::{HasSchema, Schema};

/// Reference to a nested schema.
///
/// `Static` points at an accessor so that schemas may refer to themselves or
/// to each other before they are built; `Shared` holds a schema built at
/// runtime.
#[derive(Clone)]
pub enum SchemaRef {
    /// Accessor returning a process-wide schema.
    Static(fn() -> &'static Schema),
    /// Schema built at runtime.
    Shared(Arc<Schema>),
}

impl SchemaRef {
    /// Resolves the referenced schema.
    #[must_use]
    pub fn get(&self) -> &Schema {
        match self {
            Self::Static(accessor) => accessor(),
            Self::Shared(schema) => schema,
        }
    }
}

impl fmt::Debug for SchemaRef {
    // Resolving a static accessor here could recurse for self-referencing
    // schemas, so only the variant is printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(_) => f.write_str("SchemaRef::Static"),
            Self::Shared(schema) => write!(f, "SchemaRef::Shared({})", schema.name()),
        }
    }
}

/// One member of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// Member name, matched first.
    pub name: String,
    /// Member value, matched second and used for serialization.
    pub value: String,
}

/// An enumeration type: a name plus its members.
///
/// # Examples
///
/// ```
/// use strictenv::EnumSpec;
///
/// let level = EnumSpec::new("Level", [("DEBUG", "debug"), ("INFO", "info")]);
/// assert_eq!(level.lookup("DEBUG").unwrap().value, "debug");
/// assert_eq!(level.lookup("info").unwrap().name, "INFO");
/// assert!(level.lookup("trace").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSpec {
    name: String,
    members: Vec<EnumMember>,
}

impl EnumSpec {
    /// Creates an enumeration from `(name, value)` pairs.
    pub fn new<N, V>(name: impl Into<String>, members: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            members: members
                .into_iter()
                .map(|(name, value)| EnumMember {
                    name: name.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }

    /// Enumeration name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in declaration order.
    #[must_use]
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// Finds a member by name first, then by value.
    #[must_use]
    pub fn lookup(&self, raw: &str) -> Option<&EnumMember> {
        self.members
            .iter()
            .find(|member| member.name == raw)
            .or_else(|| self.members.iter().find(|member| member.value == raw))
    }
}

/// The closed set of types a field may be declared with.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// Any value; raw strings pass through.
    Any,
    /// String.
    Str,
    /// Boolean from `1/true/t/yes/y/on` or `0/false/f/no/n/off`.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Float,
    /// ISO-8601 calendar date.
    Date,
    /// ISO-8601 time of day.
    Time,
    /// ISO-8601 timestamp, with or without offset.
    DateTime,
    /// Seconds, `[-]HH:MM[:SS[.f]]` or an ISO-8601 duration.
    Duration,
    /// Enumeration member.
    Enum(EnumSpec),
    /// JSON array of elements.
    List(Box<FieldType>),
    /// JSON array of distinct elements.
    Set(Box<FieldType>),
    /// JSON object with string keys.
    Map(Box<FieldType>),
    /// Fixed-length JSON array.
    Tuple(Vec<FieldType>),
    /// Nested schema.
    Nested(SchemaRef),
    /// First member that accepts the value wins.
    Union(Vec<FieldType>),
    /// Only `null`.
    Null,
}

impl FieldType {
    /// `Union([ty, Null])`.
    #[must_use]
    pub fn optional(ty: FieldType) -> Self {
        Self::Union(vec![ty, Self::Null])
    }

    /// `List(ty)`.
    #[must_use]
    pub fn list(ty: FieldType) -> Self {
        Self::List(Box::new(ty))
    }

    /// `Set(ty)`.
    #[must_use]
    pub fn set(ty: FieldType) -> Self {
        Self::Set(Box::new(ty))
    }

    /// `Map(ty)`.
    #[must_use]
    pub fn map(ty: FieldType) -> Self {
        Self::Map(Box::new(ty))
    }

    /// Nested field referring to a statically declared schema type.
    #[must_use]
    pub fn nested<T: HasSchema>() -> Self {
        Self::Nested(SchemaRef::Static(T::schema))
    }

    /// Nested field referring to a schema built at runtime.
    #[must_use]
    pub fn shared(schema: Arc<Schema>) -> Self {
        Self::Nested(SchemaRef::Shared(schema))
    }

    /// Whether `null` is an acceptable value.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Null | Self::Any => true,
            Self::Union(members) => members.iter().any(Self::is_nullable),
            _ => false,
        }
    }

    /// The nested schema of this type, or of the first nested union member.
    #[must_use]
    pub fn nested_schema(&self) -> Option<&SchemaRef> {
        match self {
            Self::Nested(schema) => Some(schema),
            Self::Union(members) => members.iter().find_map(|member| match member {
                Self::Nested(schema) => Some(schema),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Human-readable type name used in error messages.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::Any => "any".to_string(),
            Self::Str => "str".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Int => "int".to_string(),
            Self::Float => "float".to_string(),
            Self::Date => "date".to_string(),
            Self::Time => "time".to_string(),
            Self::DateTime => "datetime".to_string(),
            Self::Duration => "duration".to_string(),
            Self::Null => "None".to_string(),
            Self::Enum(spec) => spec.name().to_string(),
            Self::List(inner) => format!("list[{}]", inner.type_name()),
            Self::Set(inner) => format!("set[{}]", inner.type_name()),
            Self::Map(inner) => format!("dict[str, {}]", inner.type_name()),
            Self::Tuple(items) => format!(
                "tuple[{}]",
                items.iter().map(Self::type_name).collect::<Vec<_>>().join(", ")
            ),
            Self::Nested(schema) => match schema {
                SchemaRef::Shared(schema) => schema.name().to_string(),
                SchemaRef::Static(accessor) => accessor().name().to_string(),
            },
            Self::Union(members) => members
                .iter()
                .map(Self::type_name)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}
