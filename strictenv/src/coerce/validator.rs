//! Numeric and length constraint validation.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::schema::FieldInfo;
use crate::value::Value;

/// Checks a value against the `gt`/`ge`/`lt`/`le` and length bounds of a
/// field.
///
/// `null` always passes. A numeric bound on a non-numeric value, or a length
/// bound on a value without a length, is a violation.
///
/// # Examples
///
/// ```
/// use strictenv::coerce::ConstraintValidator;
/// use strictenv::{FieldInfo, Value};
///
/// let info = FieldInfo { gt: Some(0.into()), lt: Some(10.into()), ..FieldInfo::new() };
/// let validator = ConstraintValidator::new(&info);
/// assert!(validator.check(&Value::Int(5)).is_ok());
/// assert_eq!(validator.check(&Value::Int(10)).unwrap_err(), "Value must be < 10");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConstraintValidator<'a> {
    info: &'a FieldInfo,
}

impl<'a> ConstraintValidator<'a> {
    /// Validator for the constraints in `info`.
    #[must_use]
    pub fn new(info: &'a FieldInfo) -> Self {
        Self { info }
    }

    /// Returns the first violated constraint as a message.
    ///
    /// # Errors
    ///
    /// Returns the violation message.
    pub fn check(&self, value: &Value) -> std::result::Result<(), String> {
        if value.is_null() {
            return Ok(());
        }

        let info = self.info;
        let bounds = [
            (info.gt, ">", &[Ordering::Greater][..]),
            (info.ge, ">=", &[Ordering::Greater, Ordering::Equal][..]),
            (info.lt, "<", &[Ordering::Less][..]),
            (info.le, "<=", &[Ordering::Less, Ordering::Equal][..]),
        ];
        for (bound, symbol, accepted) in bounds {
            let Some(bound) = bound else { continue };
            let number = value.as_number().ok_or_else(|| {
                format!(
                    "'{symbol}' not supported between {} and number {bound}",
                    value.kind()
                )
            })?;
            let satisfied = number
                .partial_cmp_number(bound)
                .is_some_and(|ordering| accepted.contains(&ordering));
            if !satisfied {
                return Err(format!("Value must be {symbol} {bound}"));
            }
        }

        if info.min_length.is_some() || info.max_length.is_some() {
            let length = value
                .length()
                .ok_or_else(|| format!("{} has no length", value.kind()))?;
            if let Some(min) = info.min_length {
                if length < min {
                    return Err(format!("Length must be >= {min}"));
                }
            }
            if let Some(max) = info.max_length {
                if length > max {
                    return Err(format!("Length must be <= {max}"));
                }
            }
        }
        Ok(())
    }

    /// Validates `value`, reporting a violation as a parse error on `field`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] carrying `raw_value` and the violation.
    pub fn validate(&self, value: &Value, field: &str, target_type: &str, raw_value: &str) -> Result<()> {
        self.check(value).map_err(|reason| Error::Parse {
            field: field.to_string(),
            target_type: target_type.to_string(),
            raw_value: raw_value.to_string(),
            source: Some(reason.into()),
        })
    }
}
