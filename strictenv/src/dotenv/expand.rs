//! `${NAME}` interpolation over a parsed env file.

use std::collections::HashMap;
use std::path::Path;

use super::parser::ParsedFile;
use crate::environment::EnvMap;
use crate::error::{Error, Result};

/// Resolves references for every key of a parsed file.
///
/// File keys are resolved recursively and memoized; a key already on the
/// resolution stack is a cycle. Names not defined in the file go through
/// the external `lookup`.
pub(crate) struct Expander<'a> {
    parsed: &'a ParsedFile,
    origin: &'a Path,
    strict: bool,
    lookup: &'a dyn Fn(&str) -> Option<String>,
    resolved: HashMap<String, String>,
    stack: Vec<String>,
}

impl<'a> Expander<'a> {
    pub(crate) fn new(
        parsed: &'a ParsedFile,
        origin: &'a Path,
        strict: bool,
        lookup: &'a dyn Fn(&str) -> Option<String>,
    ) -> Self {
        Self {
            parsed,
            origin,
            strict,
            lookup,
            resolved: HashMap::new(),
            stack: Vec::new(),
        }
    }

    pub(crate) fn expand_all(mut self) -> Result<EnvMap> {
        let parsed = self.parsed;
        let mut expanded = EnvMap::new();
        for key in parsed.values.keys() {
            let value = self.resolve(key)?;
            expanded.insert(key, value);
        }
        Ok(expanded)
    }

    fn resolve(&mut self, key: &str) -> Result<String> {
        if let Some(value) = self.resolved.get(key) {
            return Ok(value.clone());
        }
        if self.stack.iter().any(|k| k == key) {
            if self.strict {
                let chain = self
                    .stack
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(key))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(self.format_error(key, format!("cyclic variable reference: {chain}")));
            }
            log::warn!("{}: cyclic reference to {key}, expanding to empty", self.origin.display());
            return Ok(String::new());
        }

        self.stack.push(key.to_string());
        let outcome = self.substitute(key);
        self.stack.pop();

        let expanded = outcome?;
        self.resolved.insert(key.to_string(), expanded.clone());
        Ok(expanded)
    }

    fn substitute(&mut self, key: &str) -> Result<String> {
        let parsed = self.parsed;
        let raw = parsed.values.get(key).unwrap_or_default();
        let mut output = String::with_capacity(raw.len());
        let mut rest = raw;

        while let Some(start) = rest.find("${") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match reference_name(after) {
                Some(name) => {
                    let replacement = self.lookup_reference(key, name)?;
                    output.push_str(&replacement);
                    rest = &after[name.len() + 1..];
                }
                None => {
                    output.push('$');
                    rest = &rest[start + 1..];
                }
            }
        }
        output.push_str(rest);
        Ok(output)
    }

    fn lookup_reference(&mut self, key: &str, name: &str) -> Result<String> {
        if self.parsed.values.contains_key(name) {
            return self.resolve(name);
        }
        if let Some(value) = (self.lookup)(name) {
            return Ok(value);
        }
        if self.strict {
            return Err(self.format_error(key, format!("undefined variable reference: {name}")));
        }
        log::warn!(
            "{}: undefined reference {name} in {key}, expanding to empty",
            self.origin.display()
        );
        Ok(String::new())
    }

    fn format_error(&self, key: &str, reason: String) -> Error {
        Error::EnvFileFormat {
            path: self.origin.to_path_buf(),
            line_number: self.parsed.line_numbers.get(key).copied().unwrap_or(0),
            line: self.parsed.values.get(key).unwrap_or_default().to_string(),
            reason,
        }
    }
}

/// Name of a `NAME}` reference body, if `text` starts with one.
fn reference_name(text: &str) -> Option<&str> {
    let end = text.find('}')?;
    let name = &text[..end];
    super::is_valid_key(name).then_some(name)
}
