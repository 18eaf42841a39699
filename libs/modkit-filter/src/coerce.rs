//! String → typed value coercion.
//!
//! Binding treats coercion as a pluggable capability: the builder only needs
//! `coerce(raw, kind) -> Value | CoercionError`. `DefaultCoercer` covers every
//! `FieldKind` and is what `FilterTreeBuilder::new()` uses.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::kind::FieldKind;
use crate::value::Value;

/// A raw query string could not be converted to the declared field type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot convert '{raw}' to {expected}")]
pub struct CoercionError {
    pub raw: String,
    pub expected: FieldKind,
}

impl CoercionError {
    fn new(raw: &str, expected: FieldKind) -> Self {
        Self {
            raw: raw.to_owned(),
            expected,
        }
    }
}

/// Conversion of raw query strings into typed values.
pub trait Coerce: Send + Sync {
    /// Convert `raw` into a value of `kind`.
    ///
    /// # Errors
    /// Returns `CoercionError` if `raw` is not a valid representation of `kind`.
    fn coerce(&self, raw: &str, kind: FieldKind) -> Result<Value, CoercionError>;
}

/// Built-in coercion rules.
///
/// Numbers, booleans, UUIDs and temporal values ignore surrounding whitespace;
/// strings are kept verbatim. Dates accept ISO (`2024-03-01`) and day-first
/// (`01/03/2024`) notation; datetimes accept RFC 3339, a naive ISO datetime
/// (read as UTC) or a bare date (midnight UTC).
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCoercer;

const DAY_FIRST_DATE: &str = "%d/%m/%Y";

impl Coerce for DefaultCoercer {
    fn coerce(&self, raw: &str, kind: FieldKind) -> Result<Value, CoercionError> {
        let fail = || CoercionError::new(raw, kind);
        let s = raw.trim();

        Ok(match kind {
            FieldKind::String => Value::String(raw.to_owned()),
            FieldKind::I64 => Value::I64(s.parse::<i64>().map_err(|_| fail())?),
            FieldKind::F64 => {
                let f = s.parse::<f64>().map_err(|_| fail())?;
                if !f.is_finite() {
                    return Err(fail());
                }
                Value::F64(f)
            }
            FieldKind::Bool => {
                if s.eq_ignore_ascii_case("true") {
                    Value::Bool(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Value::Bool(false)
                } else {
                    return Err(fail());
                }
            }
            FieldKind::Uuid => Value::Uuid(s.parse::<uuid::Uuid>().map_err(|_| fail())?),
            FieldKind::DateTimeUtc => Value::DateTime(parse_datetime(s).ok_or_else(fail)?),
            FieldKind::Date => Value::Date(parse_date(s).ok_or_else(fail)?),
            FieldKind::Time => Value::Time(s.parse::<NaiveTime>().map_err(|_| fail())?),
            FieldKind::Decimal => Value::Decimal(s.parse::<Decimal>().map_err(|_| fail())?),
        })
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    s.parse::<NaiveDate>()
        .ok()
        .or_else(|| NaiveDate::parse_from_str(s, DAY_FIRST_DATE).ok())
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = s.parse::<NaiveDateTime>() {
        return Some(naive.and_utc());
    }
    parse_date(s)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
