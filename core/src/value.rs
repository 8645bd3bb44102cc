//! Field coercion: raw CSV text to typed values.
//!
//! [`coerce`] turns one raw token into a [`FieldValue`] according to the
//! field's declared [`FieldType`]. Every call yields either a typed value or
//! [`FieldValue::Absent`]; malformed input is reported as a
//! [`CoercionError`], which aborts the file being loaded.
//!
//! # Empty input
//!
//! | Field                 | Result            |
//! |-----------------------|-------------------|
//! | any `Time`            | `Absent`          |
//! | required `String`     | `Text("")`        |
//! | required `Boolean`    | `Boolean(false)`  |
//! | anything else         | `Absent`          |
//!
//! A boolean is true only for exactly `"1"`, so an empty required flag reads
//! as false. An optional field that is `Absent` binds as NULL. A required
//! field that is `Absent` is the loader's concern.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::types::{FieldSpec, FieldType};

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2}):(\d{2})$").expect("static regex must compile")
});

/// A coerced field value, held for the lifetime of one record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// No value: binds as NULL for optional fields and times.
    #[default]
    Absent,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Text(String),
    Date(NaiveDate),
    /// Seconds since local midnight of the service day.
    Time(u32),
}

impl FieldValue {
    /// Returns `true` for [`FieldValue::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// Renders a date in the ISO `YYYY-MM-DD` form used for storage.
    pub fn iso_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }
}

/// Malformed field input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("field '{field}': '{value}' is not a valid integer")]
    Integer { field: &'static str, value: String },
    #[error("field '{field}': '{value}' is not a valid number")]
    Double { field: &'static str, value: String },
    #[error("field '{field}': '{value}' is not a date in YYYYMMDD form")]
    Date { field: &'static str, value: String },
    #[error("field '{field}': '{value}' is not a time in H:MM:SS or HH:MM:SS form")]
    Time { field: &'static str, value: String },
}

impl CoercionError {
    /// Name of the field whose value was rejected.
    pub fn field(&self) -> &'static str {
        match self {
            CoercionError::Integer { field, .. }
            | CoercionError::Double { field, .. }
            | CoercionError::Date { field, .. }
            | CoercionError::Time { field, .. } => field,
        }
    }
}

/// Converts one raw token to a typed value according to `spec`.
///
/// # Errors
///
/// Returns a [`CoercionError`] when the text does not fit the declared type.
/// String values never fail: overflow past the max length is handled when
/// the value is bound (see [`bounded_text`]).
///
/// # Examples
///
/// ```
/// use gtfs2db_core::{coerce, FieldSpec, FieldType, FieldValue};
///
/// let time = FieldSpec::required("arrival_time", FieldType::Time, 0);
/// assert_eq!(coerce("7:05:09", &time).unwrap(), FieldValue::Time(25_509));
/// assert_eq!(coerce("", &time).unwrap(), FieldValue::Absent);
///
/// let code = FieldSpec::optional("stop_code", FieldType::String, 16);
/// assert_eq!(coerce("", &code).unwrap(), FieldValue::Absent);
/// ```
pub fn coerce(raw: &str, spec: &FieldSpec) -> Result<FieldValue, CoercionError> {
    if raw.is_empty() {
        return Ok(match spec.field_type {
            FieldType::String if spec.required => FieldValue::Text(String::new()),
            FieldType::Boolean if spec.required => FieldValue::Boolean(false),
            _ => FieldValue::Absent,
        });
    }

    match spec.field_type {
        FieldType::Boolean => Ok(FieldValue::Boolean(raw == "1")),
        FieldType::Integer => parse_integer(raw, spec),
        FieldType::Double => parse_double(raw, spec),
        FieldType::String => Ok(FieldValue::Text(raw.to_string())),
        FieldType::Date => parse_date(raw, spec),
        FieldType::Time => parse_time(raw, spec),
    }
}

/// Returns the prefix of `text` that fits within the field's max length.
///
/// The bound counts characters, not bytes, so multi-byte text is never split
/// inside a code point.
///
/// # Examples
///
/// ```
/// use gtfs2db_core::{bounded_text, FieldSpec, FieldType};
///
/// let color = FieldSpec::optional("route_color", FieldType::String, 6);
/// assert_eq!(bounded_text("FF0000", &color), "FF0000");
/// assert_eq!(bounded_text("FF0000AA", &color), "FF0000");
/// ```
pub fn bounded_text<'a>(text: &'a str, spec: &FieldSpec) -> &'a str {
    let Some(max) = spec.max_length() else {
        return text;
    };
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn parse_integer(raw: &str, spec: &FieldSpec) -> Result<FieldValue, CoercionError> {
    raw.trim()
        .parse::<i64>()
        .map(FieldValue::Integer)
        .map_err(|_| CoercionError::Integer {
            field: spec.name,
            value: raw.to_string(),
        })
}

fn parse_double(raw: &str, spec: &FieldSpec) -> Result<FieldValue, CoercionError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(FieldValue::Double(value)),
        _ => Err(CoercionError::Double {
            field: spec.name,
            value: raw.to_string(),
        }),
    }
}

fn parse_date(raw: &str, spec: &FieldSpec) -> Result<FieldValue, CoercionError> {
    let err = || CoercionError::Date {
        field: spec.name,
        value: raw.to_string(),
    };
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }
    let number = |range: std::ops::Range<usize>| raw[range].parse::<u32>().map_err(|_| err());
    let (year, month, day) = (number(0..4)?, number(4..6)?, number(6..8)?);
    NaiveDate::from_ymd_opt(year as i32, month, day)
        .map(FieldValue::Date)
        .ok_or_else(err)
}

fn parse_time(raw: &str, spec: &FieldSpec) -> Result<FieldValue, CoercionError> {
    let err = || CoercionError::Time {
        field: spec.name,
        value: raw.to_string(),
    };
    let caps = TIME_RE.captures(raw.trim()).ok_or_else(err)?;
    let part = |i: usize| caps[i].parse::<u32>().map_err(|_| err());
    let (hours, minutes, seconds) = (part(1)?, part(2)?, part(3)?);
    if minutes >= 60 || seconds >= 60 {
        return Err(err());
    }
    Ok(FieldValue::Time(hours * 3600 + minutes * 60 + seconds))
}
