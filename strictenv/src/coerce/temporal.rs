//! ISO-8601 temporal parsing.
//!
//! Dates, times and timestamps follow the extended ISO-8601 forms. A
//! trailing `Z` on a timestamp or time is read as `+00:00`. Durations
//! accept three forms, tried in order: a bare number of seconds, a
//! `[-]HH:MM[:SS[.ffffff]]` clock value, and an ISO-8601 duration literal
//! such as `PT1H30M` or `-P1DT12H`.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::BoxError;
use crate::value::Value;

const DATETIME_OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const DATETIME_NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

fn normalize_utc(raw: &str) -> String {
    let value = raw.trim();
    match value.strip_suffix('Z') {
        Some(stripped) => format!("{stripped}+00:00"),
        None => value.to_string(),
    }
}

/// Parses a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns the chrono parse failure.
pub fn parse_date(raw: &str) -> Result<NaiveDate, BoxError> {
    Ok(NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")?)
}

/// Parses a time of day. Only a UTC offset (`Z` or `+00:00`) is accepted.
///
/// # Errors
///
/// Returns an error for malformed input or a non-UTC offset.
pub fn parse_time(raw: &str) -> Result<NaiveTime, BoxError> {
    let value = normalize_utc(raw);
    let naive = value
        .strip_suffix("+00:00")
        .or_else(|| value.strip_suffix("-00:00"))
        .unwrap_or(value.as_str());
    if naive.contains('+') || naive.rfind('-').is_some() {
        return Err("time zone offsets other than UTC are not supported".into());
    }

    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(naive, format).ok())
        .ok_or_else(|| format!("invalid isoformat time: {:?}", raw.trim()).into())
}

/// Parses a timestamp, keeping its offset when one is given.
///
/// A bare date is read as midnight.
///
/// # Errors
///
/// Returns an error when no supported form matches.
pub fn parse_datetime(raw: &str) -> Result<Value, BoxError> {
    let value = normalize_utc(raw);

    if let Some(aware) = DATETIME_OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::<FixedOffset>::parse_from_str(&value, format).ok())
    {
        return Ok(Value::DateTime(aware));
    }
    if let Some(naive) = DATETIME_NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&value, format).ok())
    {
        return Ok(Value::NaiveDateTime(naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Value::NaiveDateTime(midnight));
        }
    }
    Err(format!("invalid isoformat string: {:?}", raw.trim()).into())
}

/// Parses a duration from seconds, a clock value or an ISO-8601 literal.
///
/// # Errors
///
/// Returns an error for empty input, out-of-range clock components and
/// malformed literals.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use strictenv::coerce::temporal::parse_duration;
///
/// assert_eq!(parse_duration("90").unwrap(), Duration::seconds(90));
/// assert_eq!(parse_duration("-01:30").unwrap(), Duration::minutes(-90));
/// assert_eq!(parse_duration("PT1H30M").unwrap(), Duration::minutes(90));
/// assert!(parse_duration("00:75").is_err());
/// ```
pub fn parse_duration(raw: &str) -> Result<Duration, BoxError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err("empty duration value".into());
    }
    if is_decimal_seconds(value) {
        return seconds_to_duration(value.parse::<f64>()?);
    }
    if value.contains(':') {
        return parse_clock_duration(value);
    }
    parse_iso_duration(value)
}

// `[+-]?\d+(\.\d+)?`
fn is_decimal_seconds(value: &str) -> bool {
    let unsigned = value
        .strip_prefix('+')
        .or_else(|| value.strip_prefix('-'))
        .unwrap_or(value);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && fraction.map_or(true, digits)
}

#[allow(clippy::cast_possible_truncation)]
fn seconds_to_duration(seconds: f64) -> Result<Duration, BoxError> {
    let micros = (seconds * 1_000_000.0).round();
    if !micros.is_finite() || micros.abs() >= 9.2e18 {
        return Err(format!("duration out of range: {seconds} seconds").into());
    }
    Ok(Duration::microseconds(micros as i64))
}

#[allow(clippy::cast_precision_loss)]
fn parse_clock_duration(value: &str) -> Result<Duration, BoxError> {
    let (sign, working) = match value.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, value.strip_prefix('+').unwrap_or(value)),
    };

    let parts: Vec<&str> = working.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(format!("invalid clock duration format: {value}").into());
    }

    let hours: i64 = parts[0].trim().parse()?;
    let minutes: i64 = parts[1].trim().parse()?;
    let seconds: f64 = match parts.get(2) {
        Some(part) => part.trim().parse()?,
        None => 0.0,
    };

    if !(0..60).contains(&minutes) {
        return Err(format!("invalid minutes value in duration: {value}").into());
    }
    if !(0.0..60.0).contains(&seconds) {
        return Err(format!("invalid seconds value in duration: {value}").into());
    }

    let whole = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60))
        .ok_or_else(|| -> BoxError { format!("duration out of range: {value}").into() })?;
    seconds_to_duration(sign * (whole as f64 + seconds))
}

fn parse_iso_duration(value: &str) -> Result<Duration, BoxError> {
    let invalid = || -> BoxError { format!("invalid ISO 8601 duration: {value}").into() };

    let (sign, rest) = match value.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, value.strip_prefix('+').unwrap_or(value)),
    };
    let rest = rest.strip_prefix('P').ok_or_else(invalid)?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    let mut seconds = sum_units(date_part, &[('W', 604_800.0), ('D', 86_400.0)]).ok_or_else(invalid)?;
    let mut components = usize::from(!date_part.is_empty());
    if let Some(time) = time_part {
        if time.is_empty() {
            return Err(invalid());
        }
        seconds += sum_units(time, &[('H', 3_600.0), ('M', 60.0), ('S', 1.0)]).ok_or_else(invalid)?;
        components += 1;
    }
    if components == 0 {
        return Err(invalid());
    }
    seconds_to_duration(sign * seconds)
}

// Sums `<number><unit>` pairs whose units appear in the given order, each at
// most once.
fn sum_units(text: &str, units: &[(char, f64)]) -> Option<f64> {
    let mut total = 0.0;
    let mut number = String::new();
    let mut next_unit = 0;

    for ch in text.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            number.push(ch);
            continue;
        }
        let offset = units[next_unit..].iter().position(|(unit, _)| *unit == ch)?;
        if number.is_empty() {
            return None;
        }
        let amount: f64 = number.parse().ok()?;
        total += amount * units[next_unit + offset].1;
        next_unit += offset + 1;
        number.clear();
    }

    number.is_empty().then_some(total)
}
