//! SQL column types and the comparison rules attached to them.
//!
//! Every [`DataType`] belongs to a [`TypeKind`]. Two declared types compare
//! with the same rule exactly when their kinds match, so `CHAR` and `VARCHAR`
//! are interchangeable while `INTEGER` and `BIGINT` are not. `UNKNOWN` is used
//! for tables whose column types cannot be determined (CSV and YAML datasets);
//! it leaves values untouched and compares them with [`compare_values`].

use std::{cmp::Ordering, fmt, str::FromStr};

use anyhow::anyhow;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

use crate::data::{
    Value, compare_values, parse_boolean, parse_decimal_literal, parse_naive_date,
    parse_naive_time, parse_naive_timestamp,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot cast '{value}' to {data_type}: {reason}")]
pub struct TypeCastError {
    pub value: String,
    pub data_type: DataType,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Unknown,
    Char,
    Varchar,
    LongVarchar,
    Clob,
    Boolean,
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Float,
    Double,
    Numeric,
    Decimal,
    Date,
    Time,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Unknown,
    Text,
    Boolean,
    Integer,
    BigInteger,
    Real,
    Double,
    Decimal,
    Date,
    Time,
    Timestamp,
}

impl DataType {
    pub const ALL: &'static [DataType] = &[
        DataType::Unknown,
        DataType::Char,
        DataType::Varchar,
        DataType::LongVarchar,
        DataType::Clob,
        DataType::Boolean,
        DataType::Bit,
        DataType::TinyInt,
        DataType::SmallInt,
        DataType::Integer,
        DataType::BigInt,
        DataType::Real,
        DataType::Float,
        DataType::Double,
        DataType::Numeric,
        DataType::Decimal,
        DataType::Date,
        DataType::Time,
        DataType::Timestamp,
    ];

    pub fn sql_name(&self) -> &'static str {
        match self {
            DataType::Unknown => "UNKNOWN",
            DataType::Char => "CHAR",
            DataType::Varchar => "VARCHAR",
            DataType::LongVarchar => "LONGVARCHAR",
            DataType::Clob => "CLOB",
            DataType::Boolean => "BOOLEAN",
            DataType::Bit => "BIT",
            DataType::TinyInt => "TINYINT",
            DataType::SmallInt => "SMALLINT",
            DataType::Integer => "INTEGER",
            DataType::BigInt => "BIGINT",
            DataType::Real => "REAL",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::Numeric => "NUMERIC",
            DataType::Decimal => "DECIMAL",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::Timestamp => "TIMESTAMP",
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            DataType::Unknown => TypeKind::Unknown,
            DataType::Char | DataType::Varchar | DataType::LongVarchar | DataType::Clob => {
                TypeKind::Text
            }
            DataType::Boolean | DataType::Bit => TypeKind::Boolean,
            DataType::TinyInt | DataType::SmallInt | DataType::Integer => TypeKind::Integer,
            DataType::BigInt => TypeKind::BigInteger,
            DataType::Real => TypeKind::Real,
            DataType::Float | DataType::Double => TypeKind::Double,
            DataType::Numeric | DataType::Decimal => TypeKind::Decimal,
            DataType::Date => TypeKind::Date,
            DataType::Time => TypeKind::Time,
            DataType::Timestamp => TypeKind::Timestamp,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.kind() == TypeKind::Unknown
    }

    /// Converts `value` into the canonical representation of this type.
    pub fn type_cast(&self, value: &Value) -> Result<Value, TypeCastError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let fail = |reason: String| TypeCastError {
            value: value.as_display(),
            data_type: *self,
            reason,
        };

        let cast = match self.kind() {
            TypeKind::Unknown => value.clone(),
            TypeKind::Text => Value::String(value.as_display()),
            TypeKind::Boolean => match value {
                Value::Boolean(b) => Value::Boolean(*b),
                Value::Integer(i) => Value::Boolean(*i != 0),
                Value::String(s) => {
                    Value::Boolean(parse_boolean(s).map_err(|err| fail(err.to_string()))?)
                }
                _ => return Err(fail("not a boolean".to_string())),
            },
            TypeKind::Integer | TypeKind::BigInteger => {
                let parsed = match value {
                    Value::Integer(i) => *i,
                    Value::Boolean(b) => i64::from(*b),
                    Value::Float(f) => {
                        f.trunc().to_i64().ok_or_else(|| fail("out of range".into()))?
                    }
                    Value::Decimal(d) => {
                        d.trunc().to_i64().ok_or_else(|| fail("out of range".into()))?
                    }
                    Value::String(s) => match s.trim().parse::<i64>() {
                        Ok(parsed) => parsed,
                        Err(_) => parse_decimal_literal(s)
                            .map_err(|err| fail(err.to_string()))?
                            .trunc()
                            .to_i64()
                            .ok_or_else(|| fail("out of range".into()))?,
                    },
                    _ => return Err(fail("not a number".to_string())),
                };
                if self.kind() == TypeKind::Integer && i32::try_from(parsed).is_err() {
                    return Err(fail("out of range for a 32-bit integer".to_string()));
                }
                Value::Integer(parsed)
            }
            TypeKind::Real | TypeKind::Double => {
                let parsed = match value {
                    Value::Float(f) => *f,
                    Value::Integer(i) => *i as f64,
                    Value::Decimal(d) => d.to_f64().ok_or_else(|| fail("out of range".into()))?,
                    Value::String(s) => s
                        .trim()
                        .parse::<f64>()
                        .map_err(|err| fail(err.to_string()))?,
                    _ => return Err(fail("not a number".to_string())),
                };
                if self.kind() == TypeKind::Real {
                    Value::Float(f64::from(parsed as f32))
                } else {
                    Value::Float(parsed)
                }
            }
            TypeKind::Decimal => match value {
                Value::Decimal(d) => Value::Decimal(*d),
                Value::Integer(i) => Value::Decimal(Decimal::from(*i)),
                Value::Float(f) => Value::Decimal(
                    Decimal::from_f64(*f).ok_or_else(|| fail("not representable".into()))?,
                ),
                Value::String(s) => {
                    Value::Decimal(parse_decimal_literal(s).map_err(|err| fail(err.to_string()))?)
                }
                _ => return Err(fail("not a number".to_string())),
            },
            TypeKind::Date => match value {
                Value::Date(d) => Value::Date(*d),
                Value::Timestamp(ts) => Value::Date(ts.date()),
                Value::String(s) => {
                    Value::Date(parse_naive_date(s).map_err(|err| fail(err.to_string()))?)
                }
                _ => return Err(fail("not a date".to_string())),
            },
            TypeKind::Time => match value {
                Value::Time(t) => Value::Time(*t),
                Value::Timestamp(ts) => Value::Time(ts.time()),
                Value::String(s) => {
                    Value::Time(parse_naive_time(s).map_err(|err| fail(err.to_string()))?)
                }
                _ => return Err(fail("not a time".to_string())),
            },
            TypeKind::Timestamp => match value {
                Value::Timestamp(ts) => Value::Timestamp(*ts),
                Value::Date(d) => Value::Timestamp(d.and_time(chrono::NaiveTime::MIN)),
                Value::String(s) => Value::Timestamp(
                    parse_naive_timestamp(s).map_err(|err| fail(err.to_string()))?,
                ),
                _ => return Err(fail("not a timestamp".to_string())),
            },
        };
        Ok(cast)
    }

    /// Casts both sides to this type and orders them.
    pub fn compare(&self, left: &Value, right: &Value) -> Result<Ordering, TypeCastError> {
        let left = self.type_cast(left)?;
        let right = self.type_cast(right)?;
        Ok(compare_values(&left, &right))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

impl FromStr for DataType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        let base = normalized
            .split_once('(')
            .map(|(name, _)| name.trim())
            .unwrap_or(normalized.as_str());
        let data_type = match base {
            "UNKNOWN" => DataType::Unknown,
            "CHAR" | "CHARACTER" | "NCHAR" => DataType::Char,
            "VARCHAR" | "NVARCHAR" | "VARCHAR2" | "TEXT" | "STRING" => DataType::Varchar,
            "LONGVARCHAR" | "LONGNVARCHAR" => DataType::LongVarchar,
            "CLOB" | "NCLOB" => DataType::Clob,
            "BOOLEAN" | "BOOL" => DataType::Boolean,
            "BIT" => DataType::Bit,
            "TINYINT" => DataType::TinyInt,
            "SMALLINT" | "INT2" => DataType::SmallInt,
            "INTEGER" | "INT" | "INT4" => DataType::Integer,
            "BIGINT" | "INT8" => DataType::BigInt,
            "REAL" | "FLOAT4" => DataType::Real,
            "FLOAT" => DataType::Float,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" => DataType::Double,
            "NUMERIC" => DataType::Numeric,
            "DECIMAL" => DataType::Decimal,
            "DATE" => DataType::Date,
            "TIME" => DataType::Time,
            "TIMESTAMP" | "DATETIME" => DataType::Timestamp,
            _ => {
                return Err(anyhow!(
                    "Unknown SQL type '{value}'. Supported types: {}",
                    DataType::ALL
                        .iter()
                        .map(DataType::sql_name)
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
        };
        Ok(data_type)
    }
}
