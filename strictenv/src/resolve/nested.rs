//! Projection of flat delimited keys onto nested fields.
//!
//! With a delimiter of `__` and a prefix of `APP_`, the key
//! `APP_DATABASE__HOST` becomes `{"database": {"host": <value>}}` in the
//! working payload, provided `database` is a nested field whose schema
//! declares `host`. Segments match field names first, then aliases.

use std::collections::BTreeMap;

use log::{debug, trace};

use super::ensure_depth;
use crate::environment::EnvMap;
use crate::error::Result;
use crate::schema::Schema;
use crate::value::Value;

/// Projection settings for one load.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NestedProjection<'a> {
    pub(crate) prefix: &'a str,
    pub(crate) delimiter: &'a str,
    pub(crate) case_sensitive: bool,
    pub(crate) max_depth: Option<usize>,
}

impl NestedProjection<'_> {
    /// Writes every projectable key of `env` into `data`.
    pub(crate) fn apply(
        &self,
        env: &EnvMap,
        schema: &Schema,
        data: &mut BTreeMap<String, Value>,
    ) -> Result<()> {
        let prefix = if self.case_sensitive {
            self.prefix.to_string()
        } else {
            self.prefix.to_uppercase()
        };

        for (key, value) in env.iter() {
            let Some(stripped) = key.strip_prefix(prefix.as_str()) else {
                continue;
            };
            if !stripped.contains(self.delimiter) {
                continue;
            }
            let parts: Vec<&str> = stripped
                .split(self.delimiter)
                .filter(|part| !part.is_empty())
                .collect();
            if parts.len() < 2 {
                continue;
            }
            self.set_nested(schema, data, &parts, value, key)?;
        }
        Ok(())
    }

    fn set_nested(
        &self,
        schema: &Schema,
        data: &mut BTreeMap<String, Value>,
        parts: &[&str],
        value: &str,
        key: &str,
    ) -> Result<()> {
        let mut current = data;
        let mut current_schema = schema;
        let mut path: Vec<&str> = Vec::with_capacity(parts.len());

        for (index, part) in parts.iter().enumerate() {
            let Some(field) = current_schema.match_field(part, self.case_sensitive) else {
                trace!("{key}: segment '{part}' matches no field of {}", current_schema.name());
                return Ok(());
            };
            path.push(field.name());

            if index == parts.len() - 1 {
                debug!("projected {key} onto {}", path.join("."));
                current.insert(field.name().to_string(), Value::Str(value.to_string()));
                return Ok(());
            }

            let Some(next_schema) = field.ty().nested_schema() else {
                trace!("{key}: field '{}' is not a nested schema", field.name());
                return Ok(());
            };
            ensure_depth(self.max_depth, path.len(), &path.join("."))?;

            let slot = current
                .entry(field.name().to_string())
                .or_insert_with(|| Value::Map(BTreeMap::new()));
            if !matches!(slot, Value::Map(_)) {
                *slot = Value::Map(BTreeMap::new());
            }
            current = match slot {
                Value::Map(entries) => entries,
                _ => return Ok(()),
            };
            current_schema = next_schema.get();
        }
        Ok(())
    }
}
