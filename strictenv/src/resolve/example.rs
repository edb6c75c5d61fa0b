//! `.env` example file generation.

use std::fs;
use std::path::Path;

use log::debug;

use super::ensure_depth;
use crate::environment::format_env_key;
use crate::error::{Error, Result};
use crate::schema::{Schema, SettingsConfig};

struct ExampleEntry {
    key: String,
    description: Option<String>,
}

/// Renders an example `.env` document for `schema` using its own
/// configuration.
///
/// # Errors
///
/// See [`render_env_example_with`].
pub fn render_env_example(schema: &Schema) -> Result<String> {
    let config = schema.config().cloned().unwrap_or_default();
    render_env_example_with(schema, &config)
}

/// Renders an example `.env` document for `schema` under `config`.
///
/// Every field becomes an empty assignment named after its alias or name.
/// A description is emitted as `# ` comment lines above the key, and
/// entries are separated by one blank line. Nested schemas are expanded
/// into delimited keys only when a nested delimiter is configured;
/// otherwise the nested field is a single key.
///
/// # Errors
///
/// Returns [`Error::Config`](crate::Error::Config) for an invalid depth
/// bound or a schema that reaches itself through nested fields, and [`Error::NestedDepth`](crate::Error::NestedDepth) when the
/// expansion goes deeper than allowed.
///
/// # Examples
///
/// ```
/// use strictenv::{render_env_example, Field, FieldType, Schema, SettingsConfig};
///
/// let schema = Schema::builder("App")
///     .config(SettingsConfig { env_prefix: "APP_".into(), ..SettingsConfig::default() })
///     .field(Field::new("debug", FieldType::Bool).description("Enable debug mode"))
///     .field(Field::new("retries", FieldType::Int).default(3))
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     render_env_example(&schema).unwrap(),
///     "# Enable debug mode\nAPP_DEBUG=\n\nAPP_RETRIES=\n"
/// );
/// ```
pub fn render_env_example_with(schema: &Schema, config: &SettingsConfig) -> Result<String> {
    let max_depth = config.max_depth()?;
    let mut entries = Vec::new();
    let mut lineage = vec![schema.name().to_string()];
    collect(schema, config, max_depth, &[], &mut lineage, &mut entries)?;

    let blocks: Vec<String> = entries
        .iter()
        .map(|entry| {
            let mut block = String::new();
            if let Some(description) = &entry.description {
                for line in description.lines() {
                    block.push_str("# ");
                    block.push_str(line);
                    block.push('\n');
                }
            }
            block.push_str(&entry.key);
            block.push('=');
            block
        })
        .collect();

    if blocks.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("{}\n", blocks.join("\n\n")))
}

/// Writes the example document for `schema` to `path`, creating missing
/// parent directories.
///
/// # Errors
///
/// Everything [`render_env_example`] returns, plus [`Error::Io`](crate::Error::Io)
/// when the file or its directories cannot be written.
pub fn write_env_example(schema: &Schema, path: &Path) -> Result<()> {
    let content = render_env_example(schema)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    debug!("wrote env example for {} to {}", schema.name(), path.display());
    Ok(())
}

fn collect(
    schema: &Schema,
    config: &SettingsConfig,
    max_depth: Option<usize>,
    parents: &[&str],
    lineage: &mut Vec<String>,
    entries: &mut Vec<ExampleEntry>,
) -> Result<()> {
    let delimiter = config.nested_delimiter();

    for field in schema.fields() {
        let env_name = field.primary_env_name();

        if let (Some(nested), Some(_)) = (field.ty().nested_schema(), delimiter) {
            let mut path = parents.to_vec();
            path.push(env_name);
            ensure_depth(max_depth, path.len(), &path.join("."))?;
            let nested = nested.get();
            if lineage.iter().any(|name| name == nested.name()) {
                return Err(Error::config(format!(
                    "recursive schema reference in env example: {} -> {}",
                    lineage.join(" -> "),
                    nested.name()
                )));
            }
            lineage.push(nested.name().to_string());
            collect(nested, config, max_depth, &path, lineage, entries)?;
            lineage.pop();
            continue;
        }

        let env_path = match delimiter {
            Some(delimiter) if !parents.is_empty() => {
                let mut parts = parents.to_vec();
                parts.push(env_name);
                parts.join(delimiter)
            }
            _ => env_name.to_string(),
        };
        entries.push(ExampleEntry {
            key: format_env_key(&config.env_prefix, &env_path, config.case_sensitive),
            description: field.info().description.clone(),
        });
    }
    Ok(())
}
