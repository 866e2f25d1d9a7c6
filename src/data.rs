use std::{cmp::Ordering, fmt, str::FromStr};

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;

/// Date patterns, tried in order. Day-first wins over month-first for
/// ambiguous slash-separated inputs.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d"];

pub const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Timestamp patterns without an offset, tried in order.
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Timestamp patterns carrying an offset; parsed values are normalized to UTC.
pub const ZONED_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    String(String),
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::String(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Decimal(d) => d.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Total order over values: nulls first, same variants by their natural order,
/// mixed variants by their display text.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
        (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
        (Value::Date(a), Value::Date(b)) => a.cmp(b),
        (Value::Time(a), Value::Time(b)) => a.cmp(b),
        (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
        _ => left.as_display().cmp(&right.as_display()),
    }
}

pub fn parse_boolean(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(anyhow!("Failed to parse '{value}' as boolean")),
    }
}

pub fn parse_decimal_literal(value: &str) -> Result<Decimal> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| anyhow!("Failed to parse '{value}' as decimal"))
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    parse_naive_timestamp(trimmed)
        .map(|ts| ts.date())
        .map_err(|_| anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_time(value: &str) -> Result<NaiveTime> {
    let trimmed = value.trim();
    for fmt in TIME_FORMATS {
        if let Ok(parsed) = NaiveTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as time"))
}

/// Parses a timestamp by trying [`TIMESTAMP_FORMATS`], then
/// [`ZONED_TIMESTAMP_FORMATS`], then RFC 3339, then a bare date at midnight.
/// The first pattern that parses wins.
pub fn parse_naive_timestamp(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    for fmt in ZONED_TIMESTAMP_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed.naive_utc());
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.naive_utc());
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(parsed.and_time(NaiveTime::MIN));
        }
    }
    Err(anyhow!("Failed to parse '{value}' as timestamp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_naive_date_prefers_day_first() {
        let expected = NaiveDate::from_ymd_opt(2003, 6, 5).unwrap();
        assert_eq!(parse_naive_date("05/06/2003").unwrap(), expected);
        assert_eq!(parse_naive_date("2003-06-05").unwrap(), expected);
        assert_eq!(parse_naive_date("2003-06-05 10:11:12").unwrap(), expected);
    }

    #[test]
    fn parse_naive_timestamp_supports_fractions_offsets_and_dates() {
        let base = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(
            parse_naive_timestamp("2024-05-06 14:30:00.250").unwrap(),
            base.and_hms_milli_opt(14, 30, 0, 250).unwrap()
        );
        assert_eq!(
            parse_naive_timestamp("2024-05-06T16:30:00+02:00").unwrap(),
            base.and_hms_opt(14, 30, 0).unwrap()
        );
        assert_eq!(
            parse_naive_timestamp("2024-05-06").unwrap(),
            base.and_time(NaiveTime::MIN)
        );
        assert!(parse_naive_timestamp("yesterday").is_err());
    }

    #[test]
    fn parse_decimal_literal_accepts_scientific_notation() {
        assert_eq!(
            parse_decimal_literal("1E-5").unwrap(),
            Decimal::from_str("0.00001").unwrap()
        );
        assert_eq!(
            parse_decimal_literal(" 12.50 ").unwrap(),
            Decimal::from_str("12.50").unwrap()
        );
        assert!(parse_decimal_literal("twelve").is_err());
    }

    #[test]
    fn compare_values_orders_null_first_and_mixes_by_text() {
        assert_eq!(
            compare_values(&Value::Null, &Value::Integer(0)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&Value::from("1"), &Value::Integer(1)),
            Ordering::Equal
        );
        assert_eq!(
            compare_values(&Value::Integer(2), &Value::Integer(10)),
            Ordering::Less
        );
    }

    #[test]
    fn float_display_drops_integral_fraction() {
        assert_eq!(Value::Float(3.0).as_display(), "3");
        assert_eq!(Value::Float(0.25).as_display(), "0.25");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
