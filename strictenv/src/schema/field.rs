//! Field declarations and their metadata.

use serde::Deserialize;

use super::types::FieldType;
use crate::error::{Error, Result};
use crate::value::{Number, Value};

/// Partial field metadata: default, alias, description and constraints.
///
/// Every attribute is optional. Two records merge attribute by attribute
/// (see [`FieldInfo::merge`]).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldInfo {
    /// Default value; `None` marks the field required.
    #[serde(default, deserialize_with = "deserialize_default")]
    pub default: Option<Value>,
    /// Environment name used instead of the field name.
    pub alias: Option<String>,
    /// Human-readable description, emitted in example files.
    pub description: Option<String>,
    /// Value must be strictly greater.
    pub gt: Option<Number>,
    /// Value must be greater or equal.
    pub ge: Option<Number>,
    /// Value must be strictly lower.
    pub lt: Option<Number>,
    /// Value must be lower or equal.
    pub le: Option<Number>,
    /// Minimum length of strings and containers.
    pub min_length: Option<usize>,
    /// Maximum length of strings and containers.
    pub max_length: Option<usize>,
}

// A present-but-null `default:` in YAML means "defaults to null", which is
// different from an absent key.
fn deserialize_default<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let json = serde_json::Value::deserialize(deserializer)?;
    Ok(Some(Value::from_json(&json)))
}

impl FieldInfo {
    /// Empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the field has no default.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Merges annotation-attached metadata (`base`) with default-attached
    /// metadata (`overrides`). Each attribute set on `overrides` wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use strictenv::FieldInfo;
    ///
    /// let base = FieldInfo { alias: Some("A".into()), min_length: Some(1), ..FieldInfo::new() };
    /// let overrides = FieldInfo { alias: Some("B".into()), ..FieldInfo::new() };
    /// let merged = FieldInfo::merge(Some(&base), Some(&overrides)).unwrap();
    /// assert_eq!(merged.alias.as_deref(), Some("B"));
    /// assert_eq!(merged.min_length, Some(1));
    /// ```
    #[must_use]
    pub fn merge(base: Option<&FieldInfo>, overrides: Option<&FieldInfo>) -> Option<FieldInfo> {
        match (base, overrides) {
            (None, None) => None,
            (Some(info), None) | (None, Some(info)) => Some(info.clone()),
            (Some(base), Some(overrides)) => Some(FieldInfo {
                default: overrides.default.clone().or_else(|| base.default.clone()),
                alias: overrides.alias.clone().or_else(|| base.alias.clone()),
                description: overrides
                    .description
                    .clone()
                    .or_else(|| base.description.clone()),
                gt: overrides.gt.or(base.gt),
                ge: overrides.ge.or(base.ge),
                lt: overrides.lt.or(base.lt),
                le: overrides.le.or(base.le),
                min_length: overrides.min_length.or(base.min_length),
                max_length: overrides.max_length.or(base.max_length),
            }),
        }
    }

    /// Checks that the metadata is self-consistent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty alias, `gt` with `ge`, `lt` with
    /// `le`, inverted length bounds or a lower bound that is not below the
    /// upper bound.
    pub fn validate(&self, field: &str) -> Result<()> {
        let fail = |message: &str| Err(Error::config(format!("field '{field}': {message}")));

        if self.alias.as_deref() == Some("") {
            return fail("alias cannot be an empty string");
        }
        if self.gt.is_some() && self.ge.is_some() {
            return fail("use either gt or ge, not both");
        }
        if self.lt.is_some() && self.le.is_some() {
            return fail("use either lt or le, not both");
        }
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return fail("min_length cannot be greater than max_length");
            }
        }

        let below = |a: Number, b: Number| a.partial_cmp_number(b) == Some(std::cmp::Ordering::Less);
        let below_or_equal = |a: Number, b: Number| {
            matches!(
                a.partial_cmp_number(b),
                Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
            )
        };
        if let (Some(gt), Some(lt)) = (self.gt, self.lt) {
            if !below(gt, lt) {
                return fail("gt must be lower than lt");
            }
        }
        if let (Some(gt), Some(le)) = (self.gt, self.le) {
            if !below(gt, le) {
                return fail("gt must be lower than le");
            }
        }
        if let (Some(ge), Some(lt)) = (self.ge, self.lt) {
            if !below(ge, lt) {
                return fail("ge must be lower than lt");
            }
        }
        if let (Some(ge), Some(le)) = (self.ge, self.le) {
            if !below_or_equal(ge, le) {
                return fail("ge must be lower than or equal to le");
            }
        }
        Ok(())
    }
}

/// A field declaration: name, type, and metadata attached two ways.
///
/// Builder methods such as [`Field::default`] and [`Field::gt`] set the
/// default-attached metadata. [`Field::annotated`] attaches metadata that
/// acts as the base the default-attached metadata overrides.
///
/// # Examples
///
/// ```
/// use strictenv::{Field, FieldType};
///
/// let port = Field::new("port", FieldType::Int)
///     .default(5432)
///     .gt(0)
///     .lt(65536)
///     .description("TCP port");
/// assert_eq!(port.name(), "port");
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) ty: FieldType,
    pub(crate) annotation: Option<FieldInfo>,
    pub(crate) info: Option<FieldInfo>,
}

impl Field {
    /// Declares a required field.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            annotation: None,
            info: None,
        }
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attaches annotation metadata.
    #[must_use]
    pub fn annotated(mut self, info: FieldInfo) -> Self {
        self.annotation = Some(info);
        self
    }

    /// Replaces the default-attached metadata wholesale.
    #[must_use]
    pub fn info(mut self, info: FieldInfo) -> Self {
        self.info = Some(info);
        self
    }

    fn info_mut(&mut self) -> &mut FieldInfo {
        self.info.get_or_insert_with(FieldInfo::default)
    }

    /// Sets the default value.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.info_mut().default = Some(value.into());
        self
    }

    /// Sets the alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.info_mut().alias = Some(alias.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.info_mut().description = Some(description.into());
        self
    }

    /// Requires `value > bound`.
    #[must_use]
    pub fn gt(mut self, bound: impl Into<Number>) -> Self {
        self.info_mut().gt = Some(bound.into());
        self
    }

    /// Requires `value >= bound`.
    #[must_use]
    pub fn ge(mut self, bound: impl Into<Number>) -> Self {
        self.info_mut().ge = Some(bound.into());
        self
    }

    /// Requires `value < bound`.
    #[must_use]
    pub fn lt(mut self, bound: impl Into<Number>) -> Self {
        self.info_mut().lt = Some(bound.into());
        self
    }

    /// Requires `value <= bound`.
    #[must_use]
    pub fn le(mut self, bound: impl Into<Number>) -> Self {
        self.info_mut().le = Some(bound.into());
        self
    }

    /// Requires at least `length` characters or entries.
    #[must_use]
    pub fn min_length(mut self, length: usize) -> Self {
        self.info_mut().min_length = Some(length);
        self
    }

    /// Allows at most `length` characters or entries.
    #[must_use]
    pub fn max_length(mut self, length: usize) -> Self {
        self.info_mut().max_length = Some(length);
        self
    }

    /// Merges and validates the metadata into a resolved descriptor.
    pub(crate) fn resolve(self) -> Result<FieldDef> {
        let info = FieldInfo::merge(self.annotation.as_ref(), self.info.as_ref()).unwrap_or_default();
        info.validate(&self.name)?;
        Ok(FieldDef {
            name: self.name,
            ty: self.ty,
            info,
        })
    }
}

/// Resolved field descriptor stored in a [`Schema`](super::Schema).
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    ty: FieldType,
    info: FieldInfo,
}

impl FieldDef {
    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    #[must_use]
    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    /// Merged metadata.
    #[must_use]
    pub fn info(&self) -> &FieldInfo {
        &self.info
    }

    /// Alias, if set.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.info.alias.as_deref()
    }

    /// Default value, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.info.default.as_ref()
    }

    /// Candidate environment names, alias first.
    #[must_use]
    pub fn env_names(&self) -> Vec<&str> {
        match self.alias() {
            Some(alias) if alias != self.name => vec![alias, self.name.as_str()],
            _ => vec![self.name.as_str()],
        }
    }

    /// The preferred environment name: the alias if set, else the name.
    #[must_use]
    pub fn primary_env_name(&self) -> &str {
        self.alias().unwrap_or(&self.name)
    }
}
