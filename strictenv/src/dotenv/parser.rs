//! Line-level `.env` parser.

use std::env;
use std::fs;
use std::io;
use std::path::Path;

use super::expand::Expander;
use super::is_valid_key;
use crate::environment::EnvMap;
use crate::error::{Error, Result};

const BOM: char = '\u{feff}';

/// Reads and parses an env file, then expands `${NAME}` references.
///
/// References not defined in the file fall back to the live process
/// environment.
///
/// # Errors
///
/// In strict mode returns [`Error::EnvFileNotFound`] for a missing file,
/// [`Error::EnvFileRead`] for an unreadable or non-UTF-8 file and
/// [`Error::EnvFileFormat`] for malformed content. In lenient mode file
/// errors yield an empty map and malformed lines are skipped.
pub fn parse_env_file(path: &Path, strict: bool) -> Result<EnvMap> {
    let Some(content) = read_env_file(path, strict)? else {
        return Ok(EnvMap::new());
    };
    parse_env_str(&content, path, strict)
}

/// Parses env content that was already read from `origin`.
///
/// `origin` is only used in diagnostics.
///
/// # Errors
///
/// Returns [`Error::EnvFileFormat`] for malformed content in strict mode.
pub fn parse_env_str(content: &str, origin: &Path, strict: bool) -> Result<EnvMap> {
    parse_env_str_with(content, origin, strict, &|name: &str| env::var(name).ok())
}

/// Parses env content, resolving external references through `lookup`.
///
/// # Errors
///
/// Returns [`Error::EnvFileFormat`] for malformed content in strict mode.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use strictenv::dotenv::parse_env_str_with;
///
/// let lookup = |name: &str| (name == "HOME").then(|| "/home/app".to_string());
/// let values = parse_env_str_with("CACHE=${HOME}/.cache", Path::new(".env"), true, &lookup)
///     .unwrap();
/// assert_eq!(values.get("CACHE"), Some("/home/app/.cache"));
/// ```
pub fn parse_env_str_with(
    content: &str,
    origin: &Path,
    strict: bool,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<EnvMap> {
    let content = content.strip_prefix(BOM).unwrap_or(content);
    let lines: Vec<&str> = content.lines().collect();
    let parsed = Parser {
        lines: &lines,
        origin,
        strict,
    }
    .parse()?;

    let expanded = Expander::new(&parsed, origin, strict, lookup).expand_all()?;
    log::debug!("parsed {} keys from {}", expanded.len(), origin.display());
    Ok(expanded)
}

fn read_env_file(path: &Path, strict: bool) -> Result<Option<String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            if strict {
                return Err(Error::EnvFileNotFound {
                    path: path.to_path_buf(),
                });
            }
            log::warn!("env file {} not found, ignoring", path.display());
            return Ok(None);
        }
        Err(err) => {
            if strict {
                return Err(Error::EnvFileRead {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                    source: Some(err),
                });
            }
            log::warn!("env file {} unreadable, ignoring: {err}", path.display());
            return Ok(None);
        }
    };

    match String::from_utf8(bytes) {
        Ok(content) => Ok(Some(content)),
        Err(_) if strict => Err(Error::EnvFileRead {
            path: path.to_path_buf(),
            reason: "invalid UTF-8 encoding".to_string(),
            source: None,
        }),
        Err(_) => {
            log::warn!("env file {} is not valid UTF-8, ignoring", path.display());
            Ok(None)
        }
    }
}

/// Parsed entries plus the line each key was declared on.
pub(crate) struct ParsedFile {
    pub(crate) values: EnvMap,
    pub(crate) line_numbers: std::collections::HashMap<String, usize>,
}

struct Parser<'a> {
    lines: &'a [&'a str],
    origin: &'a Path,
    strict: bool,
}

impl Parser<'_> {
    fn parse(&self) -> Result<ParsedFile> {
        let mut parsed = ParsedFile {
            values: EnvMap::new(),
            line_numbers: std::collections::HashMap::new(),
        };
        let mut index = 0;

        while index < self.lines.len() {
            let line_number = index + 1;
            let stripped = self.lines[index].trim();

            if stripped.is_empty() || stripped.starts_with('#') {
                index += 1;
                continue;
            }

            let entry = stripped
                .strip_prefix("export ")
                .map_or(stripped, str::trim_start);

            let Some((raw_key, raw_value)) = entry.split_once('=') else {
                self.reject(line_number, stripped, "missing '=' delimiter")?;
                index += 1;
                continue;
            };

            let key = raw_key.trim();
            if key.is_empty() {
                self.reject(line_number, stripped, "empty key")?;
                index += 1;
                continue;
            }
            if !is_valid_key(key) {
                self.reject(line_number, stripped, "invalid variable name")?;
                index += 1;
                continue;
            }
            if self.strict && parsed.values.contains_key(key) {
                return Err(self.format_error(line_number, stripped, format!("duplicate key: {key}")));
            }

            let (value, next_index) = self.parse_value(index, raw_value)?;
            parsed.values.insert(key, value);
            parsed.line_numbers.insert(key.to_string(), line_number);
            index = next_index;
        }

        Ok(parsed)
    }

    fn parse_value(&self, start_index: usize, raw_value: &str) -> Result<(String, usize)> {
        let value = raw_value.trim_start();
        match value.chars().next() {
            None => Ok((String::new(), start_index + 1)),
            Some(quote @ ('"' | '\'')) => self.parse_quoted(start_index, value, quote),
            Some(_) => Ok((strip_inline_comment(value), start_index + 1)),
        }
    }

    fn parse_quoted(&self, start_index: usize, initial: &str, quote: char) -> Result<(String, usize)> {
        let mut buffer = initial.to_string();
        let mut index = start_index;

        loop {
            if let Some(closing) = find_unescaped_quote(&buffer, quote, 1) {
                let trailing = buffer[closing + 1..].trim();
                if self.strict && !trailing.is_empty() && !trailing.starts_with('#') {
                    return Err(self.format_error(
                        start_index + 1,
                        &buffer,
                        "unexpected characters after closing quote",
                    ));
                }
                return Ok((unescape_quoted(&buffer[1..closing], quote), index + 1));
            }

            index += 1;
            if index >= self.lines.len() {
                if self.strict {
                    return Err(self.format_error(
                        start_index + 1,
                        initial,
                        "unterminated quoted value",
                    ));
                }
                log::warn!(
                    "{}:{}: unterminated quoted value, keeping partial content",
                    self.origin.display(),
                    start_index + 1
                );
                return Ok((unescape_quoted(&buffer[1..], quote), self.lines.len()));
            }
            buffer.push('\n');
            buffer.push_str(self.lines[index]);
        }
    }

    /// Fails in strict mode, otherwise logs and lets the caller skip the line.
    fn reject(&self, line_number: usize, line: &str, reason: &str) -> Result<()> {
        if self.strict {
            return Err(self.format_error(line_number, line, reason));
        }
        log::warn!(
            "{}:{line_number}: skipping line ({reason})",
            self.origin.display()
        );
        Ok(())
    }

    fn format_error(&self, line_number: usize, line: &str, reason: impl Into<String>) -> Error {
        Error::EnvFileFormat {
            path: self.origin.to_path_buf(),
            line_number,
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

/// Byte offset of the first unescaped `quote` at or after `start`.
fn find_unescaped_quote(text: &str, quote: char, start: usize) -> Option<usize> {
    let quote = quote as u8;
    let mut escaped = false;
    for (offset, &byte) in text.as_bytes().iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
        } else if byte == b'\\' {
            escaped = true;
        } else if byte == quote {
            return Some(offset);
        }
    }
    None
}

/// Cuts an unquoted value at the first `#` that starts the value or follows
/// whitespace. `\#` never starts a comment.
fn strip_inline_comment(value: &str) -> String {
    let mut previous: Option<char> = None;
    for (offset, c) in value.char_indices() {
        if c == '#' && previous != Some('\\') && previous.map_or(true, char::is_whitespace) {
            return value[..offset].trim_end().to_string();
        }
        previous = Some(c);
    }
    value.trim().to_string()
}

fn unescape_quoted(value: &str, quote: char) -> String {
    let mut parsed = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            parsed.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            parsed.push('\\');
            break;
        };
        let replacement = match (quote, next) {
            (_, '\\') => '\\',
            ('\'', '\'') => '\'',
            ('"', '"') => '"',
            ('"', 'n') => '\n',
            ('"', 'r') => '\r',
            ('"', 't') => '\t',
            ('"', '$') => '$',
            (_, other) => other,
        };
        parsed.push(replacement);
    }
    parsed
}
