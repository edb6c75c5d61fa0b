//! Type coercion.
//!
//! [`coerce_value`] turns one raw environment string into a [`Value`] of
//! the declared [`FieldType`] and validates the field's constraints.
//! [`convert_value`] is its strict counterpart for values that are already
//! structured, such as the elements of a decoded JSON payload or in-memory
//! overrides: integers widen to floats and strings parse into temporal and
//! enum types, nothing else is converted.
//!
//! # Examples
//!
//! ```
//! use strictenv::coerce::coerce_value;
//! use strictenv::{FieldInfo, FieldType, Value};
//!
//! let info = FieldInfo::new();
//! let ports = coerce_value("[80, 443]", &FieldType::list(FieldType::Int), "ports", &info).unwrap();
//! assert_eq!(ports, Value::List(vec![Value::Int(80), Value::Int(443)]));
//!
//! let flag = coerce_value("Yes", &FieldType::Bool, "debug", &info).unwrap();
//! assert_eq!(flag, Value::Bool(true));
//! ```

pub mod temporal;
pub mod validator;

use std::collections::BTreeMap;

pub use validator::ConstraintValidator;

use crate::error::{BoxError, Error, Result};
use crate::schema::{EnumSpec, FieldInfo, FieldType, Schema};
use crate::value::{EnumValue, Record, Value};

const TRUE_TOKENS: &[&str] = &["1", "true", "t", "yes", "y", "on"];
const FALSE_TOKENS: &[&str] = &["0", "false", "f", "no", "n", "off"];

/// Parses a boolean token, case-insensitively and ignoring surrounding
/// whitespace.
///
/// # Errors
///
/// Returns an error for any token outside `1/true/t/yes/y/on` and
/// `0/false/f/no/n/off`.
pub fn parse_bool(raw: &str) -> std::result::Result<bool, BoxError> {
    let token = raw.trim().to_lowercase();
    if TRUE_TOKENS.contains(&token.as_str()) {
        Ok(true)
    } else if FALSE_TOKENS.contains(&token.as_str()) {
        Ok(false)
    } else {
        Err(format!("invalid boolean value: {raw}").into())
    }
}

fn enum_member(spec: &EnumSpec, raw: &str) -> std::result::Result<Value, BoxError> {
    spec.lookup(raw)
        .map(|member| {
            Value::Enum(EnumValue {
                enum_name: spec.name().to_string(),
                member: member.name.clone(),
                value: member.value.clone(),
            })
        })
        .ok_or_else(|| format!("{raw:?} is not a valid {}", spec.name()).into())
}

fn parse_error(field: &str, ty: &FieldType, raw: &str, source: Option<BoxError>) -> Error {
    Error::Parse {
        field: field.to_string(),
        target_type: ty.type_name(),
        raw_value: raw.to_string(),
        source,
    }
}

/// Coerces a raw string into `ty` and validates the constraints in `info`.
///
/// Union members are tried left to right, skipping `null`; the first
/// success wins. Collections, tuples and nested schemas are decoded from
/// JSON.
///
/// # Errors
///
/// Returns [`Error::Parse`] scoped to `field` when the string does not
/// parse or a constraint is violated. For unions the last member's failure
/// is kept as the source.
pub fn coerce_value(raw: &str, ty: &FieldType, field: &str, info: &FieldInfo) -> Result<Value> {
    if let FieldType::Union(members) = ty {
        let mut last_error = None;
        for member in members.iter().filter(|member| !matches!(member, FieldType::Null)) {
            match coerce_value(raw, member, field, info) {
                Ok(value) => return Ok(value),
                Err(err) => last_error = Some(err),
            }
        }
        return Err(parse_error(
            field,
            ty,
            raw,
            last_error.map(|err| Box::new(err) as BoxError),
        ));
    }

    let value = parse_scalar(raw, ty).map_err(|err| parse_error(field, ty, raw, Some(err)))?;
    ConstraintValidator::new(info).validate(&value, field, &ty.type_name(), raw)?;
    Ok(value)
}

/// Finite floats only; non-finite values have no JSON form for typed settings.
fn parse_float(raw: &str) -> std::result::Result<f64, BoxError> {
    let value: f64 = raw.trim().parse()?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("non-finite float: {}", raw.trim()).into())
    }
}

fn parse_scalar(raw: &str, ty: &FieldType) -> std::result::Result<Value, BoxError> {
    Ok(match ty {
        FieldType::Any | FieldType::Str => Value::Str(raw.to_string()),
        FieldType::Bool => Value::Bool(parse_bool(raw)?),
        FieldType::Int => Value::Int(raw.trim().parse()?),
        FieldType::Float => Value::Float(parse_float(raw)?),
        FieldType::Date => Value::Date(temporal::parse_date(raw)?),
        FieldType::Time => Value::Time(temporal::parse_time(raw)?),
        FieldType::DateTime => temporal::parse_datetime(raw)?,
        FieldType::Duration => Value::Duration(temporal::parse_duration(raw)?),
        FieldType::Enum(spec) => enum_member(spec, raw)?,
        FieldType::List(_)
        | FieldType::Set(_)
        | FieldType::Map(_)
        | FieldType::Tuple(_)
        | FieldType::Nested(_)
        | FieldType::Union(_)
        | FieldType::Null => {
            let json: serde_json::Value = serde_json::from_str(raw)?;
            convert(&Value::from_json(&json), ty, "$")?
        }
    })
}

/// Strictly converts an already structured value into `ty`.
///
/// Nested schemas accept a map (missing fields take their defaults, which
/// are converted the same way) or a record of the same schema.
///
/// # Errors
///
/// Returns [`Error::Parse`] scoped to `field` describing the first
/// mismatch, with its location inside the value.
pub fn convert_value(value: &Value, ty: &FieldType, field: &str) -> Result<Value> {
    convert(value, ty, "$").map_err(|reason| Error::Parse {
        field: field.to_string(),
        target_type: ty.type_name(),
        raw_value: value.to_string(),
        source: Some(reason.into()),
    })
}

fn mismatch(ty: &FieldType, value: &Value, at: &str) -> String {
    format!("expected `{}`, got `{}` - at `{at}`", ty.type_name(), value.kind())
}

fn convert(value: &Value, ty: &FieldType, at: &str) -> std::result::Result<Value, String> {
    let fail = || Err(mismatch(ty, value, at));
    let text = |parse: fn(&str) -> std::result::Result<Value, BoxError>| match value {
        Value::Str(raw) => parse(raw).map_err(|err| format!("{err} - at `{at}`")),
        _ => Err(mismatch(ty, value, at)),
    };

    match ty {
        FieldType::Any => Ok(value.clone()),
        FieldType::Null => match value {
            Value::Null => Ok(Value::Null),
            _ => fail(),
        },
        FieldType::Str => match value {
            Value::Str(_) => Ok(value.clone()),
            _ => fail(),
        },
        FieldType::Bool => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => fail(),
        },
        FieldType::Int => match value {
            Value::Int(_) => Ok(value.clone()),
            _ => fail(),
        },
        FieldType::Float => match value {
            Value::Float(number) if number.is_finite() => Ok(value.clone()),
            Value::Int(_) => Ok(Value::Float(value.as_float().unwrap_or_default())),
            _ => fail(),
        },
        FieldType::Date => match value {
            Value::Date(_) => Ok(value.clone()),
            _ => text(|raw| Ok(Value::Date(temporal::parse_date(raw)?))),
        },
        FieldType::Time => match value {
            Value::Time(_) => Ok(value.clone()),
            _ => text(|raw| Ok(Value::Time(temporal::parse_time(raw)?))),
        },
        FieldType::DateTime => match value {
            Value::DateTime(_) | Value::NaiveDateTime(_) => Ok(value.clone()),
            _ => text(temporal::parse_datetime),
        },
        FieldType::Duration => match value {
            Value::Duration(_) => Ok(value.clone()),
            Value::Int(_) | Value::Float(_) => {
                temporal::parse_duration(&value.to_string()).map(Value::Duration).map_err(|err| err.to_string())
            }
            _ => text(|raw| Ok(Value::Duration(temporal::parse_duration(raw)?))),
        },
        FieldType::Enum(spec) => match value {
            Value::Enum(member) if member.enum_name == spec.name() => Ok(value.clone()),
            Value::Str(raw) => enum_member(spec, raw).map_err(|err| format!("{err} - at `{at}`")),
            _ => fail(),
        },
        FieldType::List(inner) => match value {
            Value::List(items) | Value::Set(items) => Ok(Value::List(convert_items(items, inner, at)?)),
            _ => fail(),
        },
        FieldType::Set(inner) => match value {
            Value::List(items) | Value::Set(items) => {
                let mut distinct: Vec<Value> = Vec::new();
                for item in convert_items(items, inner, at)? {
                    if !distinct.contains(&item) {
                        distinct.push(item);
                    }
                }
                Ok(Value::Set(distinct))
            }
            _ => fail(),
        },
        FieldType::Tuple(members) => match value {
            Value::List(items) if items.len() == members.len() => items
                .iter()
                .zip(members)
                .enumerate()
                .map(|(index, (item, member))| convert(item, member, &format!("{at}[{index}]")))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::List),
            Value::List(items) => Err(format!(
                "expected array of length {}, got {} - at `{at}`",
                members.len(),
                items.len()
            )),
            _ => fail(),
        },
        FieldType::Map(inner) => match value {
            Value::Map(entries) => entries
                .iter()
                .map(|(key, item)| Ok((key.clone(), convert(item, inner, &format!("{at}[{key:?}]"))?)))
                .collect::<std::result::Result<BTreeMap<_, _>, String>>()
                .map(Value::Map),
            _ => fail(),
        },
        FieldType::Nested(schema) => {
            let schema = schema.get();
            match value {
                Value::Record(record) if record.schema_name() == schema.name() => Ok(value.clone()),
                Value::Map(entries) => convert_record(entries, schema, at).map(Value::Record),
                _ => fail(),
            }
        }
        FieldType::Union(members) => {
            if value.is_null() {
                return if ty.is_nullable() { Ok(Value::Null) } else { fail() };
            }
            let mut last = None;
            for member in members.iter().filter(|member| !matches!(member, FieldType::Null)) {
                match convert(value, member, at) {
                    Ok(converted) => return Ok(converted),
                    Err(reason) => last = Some(reason),
                }
            }
            Err(last.unwrap_or_else(|| mismatch(ty, value, at)))
        }
    }
}

fn convert_items(items: &[Value], inner: &FieldType, at: &str) -> std::result::Result<Vec<Value>, String> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| convert(item, inner, &format!("{at}[{index}]")))
        .collect()
}

fn convert_record(
    entries: &BTreeMap<String, Value>,
    schema: &Schema,
    at: &str,
) -> std::result::Result<Record, String> {
    let mut record = Record::new(schema.name());
    for field in schema.fields() {
        let location = format!("{at}.{}", field.name());
        let value = match (entries.get(field.name()), field.default_value()) {
            (Some(value), _) | (None, Some(value)) => convert(value, field.ty(), &location)?,
            (None, None) => {
                return Err(format!("object missing required field `{}` - at `{at}`", field.name()))
            }
        };
        ConstraintValidator::new(field.info())
            .check(&value)
            .map_err(|reason| format!("{reason} - at `{location}`"))?;
        record.insert(field.name(), value);
    }
    Ok(record)
}
