use std::fmt;

use serde::Serialize;

use crate::data::Value;

/// One mismatching cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Difference {
    pub expected_table: String,
    pub actual_table: String,
    pub row: usize,
    pub column: String,
    pub expected: Value,
    pub actual: Value,
}

impl Difference {
    pub fn new(
        expected_table: impl Into<String>,
        actual_table: impl Into<String>,
        row: usize,
        column: impl Into<String>,
        expected: Value,
        actual: Value,
    ) -> Self {
        Self {
            expected_table: expected_table.into(),
            actual_table: actual_table.into(),
            row,
            column: column.into(),
            expected,
            actual,
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "table={}, row={}, col={}: expected:<{}> but was:<{}>",
            self.expected_table, self.row, self.column, self.expected, self.actual
        )
    }
}
