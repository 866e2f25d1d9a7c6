use std::cmp::Ordering;

use log::debug;

use super::{AssertionError, tolerance::Precision};
use crate::{
    data::Value,
    data_type::{DataType, TypeCastError},
    dataset::Column,
};

/// A column as it is compared: the resolved type plus an optional tolerance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonColumn {
    pub column_name: String,
    pub data_type: DataType,
    pub tolerance: Option<Precision>,
}

impl ComparisonColumn {
    /// Picks the comparison type for a column present on both sides. Equal
    /// kinds use the expected type, an unknown side defers to the other, and
    /// two different concrete kinds conflict.
    pub fn resolve(
        table_name: &str,
        expected: &Column,
        actual: &Column,
        tolerance: Option<Precision>,
    ) -> Result<Self, AssertionError> {
        let data_type = if expected.data_type.kind() == actual.data_type.kind() {
            expected.data_type
        } else if expected.data_type.is_unknown() {
            actual.data_type
        } else if actual.data_type.is_unknown() {
            expected.data_type
        } else {
            return Err(AssertionError::TypeConflict {
                table: table_name.to_string(),
                column: expected.name.clone(),
                expected: expected.data_type,
                actual: actual.data_type,
            });
        };
        if let Some(precision) = &tolerance {
            debug!(
                "Column '{table_name}.{}' compared with tolerance {precision}",
                expected.name
            );
        }
        Ok(Self {
            column_name: expected.name.clone(),
            data_type,
            tolerance,
        })
    }

    pub fn compare(&self, expected: &Value, actual: &Value) -> Result<Ordering, TypeCastError> {
        match &self.tolerance {
            Some(precision) if !expected.is_null() && !actual.is_null() => {
                let (Value::Decimal(e), Value::Decimal(a)) = (
                    DataType::Decimal.type_cast(expected)?,
                    DataType::Decimal.type_cast(actual)?,
                ) else {
                    return self.data_type.compare(expected, actual);
                };
                if precision.accepts(e, a) {
                    Ok(Ordering::Equal)
                } else {
                    Ok(e.cmp(&a))
                }
            }
            _ => self.data_type.compare(expected, actual),
        }
    }
}
