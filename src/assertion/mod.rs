//! Table and dataset equality.
//!
//! Tables are equal when they have the same number of rows, the same set of
//! column names (order and declared types may differ) and equal values cell
//! by cell, rows matched by index and columns by name. Mismatching cells are
//! reported as [`Difference`]s to a [`FailureHandler`], which decides whether
//! the comparison stops.

pub mod column;
pub mod difference;
pub mod handler;
pub mod tolerance;

use std::{cmp::Ordering, error::Error as StdError};

use itertools::Itertools;
use log::debug;
use thiserror::Error;

pub use column::ComparisonColumn;
pub use difference::Difference;
pub use handler::{
    DefaultFailureHandler, DiffCollectingFailureHandler, FailureFactory, FailureHandler,
};
pub use tolerance::{InvalidPrecision, Precision, ToleratedDelta, ToleratedDeltaMap};

use crate::{
    data::Value,
    data_type::{DataType, TypeCastError},
    dataset::{
        Column, DataSet, DataSetError, Table,
        filter::{ColumnFilter, FilteredTable},
    },
};

#[derive(Debug, Error)]
pub enum AssertionError {
    #[error(
        "table count: expected <{}> table(s) [{}] but was <{}> table(s) [{}]",
        expected.len(),
        expected.join(", "),
        actual.len(),
        actual.join(", ")
    )]
    TableCountMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("tables: expected [{}] but was [{}]", expected.join(", "), actual.join(", "))]
    TableNamesMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("row count (table={table}): expected:<{expected}> but was:<{actual}>")]
    RowCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },
    #[error(
        "column mismatch (table={table}): expected [{}] but was [{}] (missing: [{}], unexpected: [{}])",
        expected.join(", "),
        actual.join(", "),
        missing.join(", "),
        extra.join(", ")
    )]
    ColumnsMismatch {
        table: String,
        expected: Vec<String>,
        actual: Vec<String>,
        missing: Vec<String>,
        extra: Vec<String>,
    },
    #[error(
        "Incompatible data types for column '{column}' of table '{table}': expected {expected} but was {actual}"
    )]
    TypeConflict {
        table: String,
        column: String,
        expected: DataType,
        actual: DataType,
    },
    #[error("{message}")]
    ValueMismatch {
        message: String,
        difference: Difference,
    },
    #[error(transparent)]
    DataSet(#[from] DataSetError),
    #[error(transparent)]
    TypeCast(#[from] TypeCastError),
    #[error("{0}")]
    Custom(Box<dyn StdError + Send + Sync>),
}

/// Returns `true` for a `(column, expected, actual)` combination that should
/// not be compared.
pub type SkipHook = Box<dyn Fn(&str, &Value, &Value) -> bool>;

/// Compares tables and datasets.
///
/// A `DbAssertion` accumulates tolerance registrations and is meant for a
/// single caller at a time.
#[derive(Default)]
pub struct DbAssertion {
    tolerated_deltas: ToleratedDeltaMap,
    skip_hook: Option<SkipHook>,
}

impl DbAssertion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerated_deltas(mut self, deltas: ToleratedDeltaMap) -> Self {
        self.tolerated_deltas = deltas;
        self
    }

    pub fn with_skip_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &Value, &Value) -> bool + 'static,
    {
        self.skip_hook = Some(Box::new(hook));
        self
    }

    pub fn tolerated_deltas(&self) -> &ToleratedDeltaMap {
        &self.tolerated_deltas
    }

    pub fn tolerated_deltas_mut(&mut self) -> &mut ToleratedDeltaMap {
        &mut self.tolerated_deltas
    }

    /// Compares two tables, failing on the first difference.
    pub fn assert_equals(
        &self,
        expected: &dyn Table,
        actual: &dyn Table,
    ) -> Result<(), AssertionError> {
        self.assert_equals_table(expected, actual, &mut DefaultFailureHandler::new())
    }

    /// Compares two datasets, failing on the first difference.
    pub fn assert_equals_datasets(
        &self,
        expected: &DataSet,
        actual: &DataSet,
    ) -> Result<(), AssertionError> {
        self.assert_equals_dataset(expected, actual, &mut DefaultFailureHandler::new())
    }

    pub fn assert_equals_dataset(
        &self,
        expected: &DataSet,
        actual: &DataSet,
        handler: &mut dyn FailureHandler,
    ) -> Result<(), AssertionError> {
        if std::ptr::eq(expected, actual) {
            return Ok(());
        }
        self.assert_same_table_names(expected, actual)?;
        for expected_table in expected.tables() {
            let actual_table = actual.table(expected_table.table_name())?;
            self.assert_equals_table(expected_table, actual_table, handler)?;
        }
        Ok(())
    }

    /// Checks that both datasets hold the same table names, ignoring case and
    /// order.
    pub fn assert_same_table_names(
        &self,
        expected: &DataSet,
        actual: &DataSet,
    ) -> Result<(), AssertionError> {
        let expected_names = sorted_upper(expected.table_names());
        let actual_names = sorted_upper(actual.table_names());
        if expected_names.len() != actual_names.len() {
            return Err(AssertionError::TableCountMismatch {
                expected: expected_names,
                actual: actual_names,
            });
        }
        if expected_names != actual_names {
            return Err(AssertionError::TableNamesMismatch {
                expected: expected_names,
                actual: actual_names,
            });
        }
        Ok(())
    }

    pub fn assert_equals_table(
        &self,
        expected: &dyn Table,
        actual: &dyn Table,
        handler: &mut dyn FailureHandler,
    ) -> Result<(), AssertionError> {
        if std::ptr::addr_eq(expected, actual) {
            debug!("Table '{}' compared against itself", expected.table_name());
            return Ok(());
        }

        let table_name = expected.table_name();
        if expected.row_count() != actual.row_count() {
            return Err(AssertionError::RowCountMismatch {
                table: table_name.to_string(),
                expected: expected.row_count(),
                actual: actual.row_count(),
            });
        }
        if expected.row_count() == 0 {
            debug!("Table '{table_name}' is empty on both sides");
            return Ok(());
        }

        let columns = self.comparison_columns(expected, actual)?;
        debug!(
            "Comparing table '{table_name}': {} row(s) x {} column(s)",
            expected.row_count(),
            columns.len()
        );
        for row in 0..expected.row_count() {
            for column in &columns {
                let expected_value = expected.value(row, &column.column_name)?;
                let actual_value = actual.value(row, &column.column_name)?;
                if let Some(skip) = &self.skip_hook
                    && skip(&column.column_name, &expected_value, &actual_value)
                {
                    continue;
                }
                if column.compare(&expected_value, &actual_value)? != Ordering::Equal {
                    let difference = Difference::new(
                        table_name,
                        actual.table_name(),
                        row,
                        column.column_name.clone(),
                        expected_value,
                        actual_value,
                    );
                    handler.handle(expected, actual, difference)?;
                }
            }
        }
        Ok(())
    }

    /// Compares the tables without the named columns.
    pub fn assert_equals_ignore_cols<S: AsRef<str>>(
        &self,
        expected: &dyn Table,
        actual: &dyn Table,
        ignore_columns: &[S],
        handler: &mut dyn FailureHandler,
    ) -> Result<(), AssertionError> {
        let filter = ColumnFilter::excluding(ignore_columns)
            .map_err(|err| AssertionError::Custom(err.into()))?;
        self.assert_equals_with_filter(expected, actual, &filter, handler)
    }

    pub fn assert_equals_with_filter(
        &self,
        expected: &dyn Table,
        actual: &dyn Table,
        filter: &ColumnFilter,
        handler: &mut dyn FailureHandler,
    ) -> Result<(), AssertionError> {
        let expected = FilteredTable::new(expected, filter);
        let actual = FilteredTable::new(actual, filter);
        self.assert_equals_table(&expected, &actual, handler)
    }

    /// Reconciles the column sets of both tables and resolves one comparison
    /// type per column, in case-insensitive name order.
    pub fn comparison_columns(
        &self,
        expected: &dyn Table,
        actual: &dyn Table,
    ) -> Result<Vec<ComparisonColumn>, AssertionError> {
        let table_name = expected.table_name();
        let expected_columns = sorted_columns(&expected.metadata().columns);
        let actual_columns = sorted_columns(&actual.metadata().columns);

        let same_names = expected_columns.len() == actual_columns.len()
            && expected_columns
                .iter()
                .zip(&actual_columns)
                .all(|(e, a)| e.name.eq_ignore_ascii_case(&a.name));
        if !same_names {
            let missing = expected_columns
                .iter()
                .filter(|e| actual.metadata().column(&e.name).is_none())
                .map(|c| c.name.clone())
                .collect();
            let extra = actual_columns
                .iter()
                .filter(|a| expected.metadata().column(&a.name).is_none())
                .map(|c| c.name.clone())
                .collect();
            return Err(AssertionError::ColumnsMismatch {
                table: table_name.to_string(),
                expected: expected_columns.iter().map(|c| c.name.clone()).collect(),
                actual: actual_columns.iter().map(|c| c.name.clone()).collect(),
                missing,
                extra,
            });
        }

        expected_columns
            .iter()
            .zip(&actual_columns)
            .map(|(e, a)| {
                let tolerance = self.tolerated_deltas.precision(table_name, &e.name);
                ComparisonColumn::resolve(table_name, e, a, tolerance)
            })
            .collect()
    }
}

fn sorted_columns(columns: &[Column]) -> Vec<&Column> {
    columns
        .iter()
        .sorted_by_cached_key(|c| c.name.to_ascii_uppercase())
        .collect()
}

fn sorted_upper(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|name| name.to_ascii_uppercase())
        .sorted()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DefaultTable, TableMetaData};

    fn table(name: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> DefaultTable {
        DefaultTable::new(TableMetaData::new(
            name,
            columns.iter().map(|c| Column::unknown(*c)).collect(),
        ))
        .with_rows(rows)
        .unwrap()
    }

    #[test]
    fn same_instance_is_equal_without_reading_rows() {
        let t = table("T", &["A"], vec![vec![Value::from("x")]]);
        assert!(DbAssertion::new().assert_equals(&t, &t).is_ok());
    }

    #[test]
    fn row_count_mismatch_is_fatal() {
        let e = table("T", &["A"], vec![vec![Value::from("x")]]);
        let a = table("T", &["A"], Vec::new());
        let err = DbAssertion::new()
            .assert_equals_table(&e, &a, &mut DiffCollectingFailureHandler::new())
            .unwrap_err();
        assert!(matches!(
            err,
            AssertionError::RowCountMismatch { expected: 1, actual: 0, .. }
        ));
    }

    #[test]
    fn column_mismatch_lists_both_sides() {
        let e = table("T", &["B", "a"], vec![vec![Value::Null, Value::Null]]);
        let a = table("T", &["A", "C"], vec![vec![Value::Null, Value::Null]]);
        let err = DbAssertion::new().assert_equals(&e, &a).unwrap_err();
        match err {
            AssertionError::ColumnsMismatch {
                expected,
                actual,
                missing,
                extra,
                ..
            } => {
                assert_eq!(expected, vec!["a", "B"]);
                assert_eq!(actual, vec!["A", "C"]);
                assert_eq!(missing, vec!["B"]);
                assert_eq!(extra, vec!["C"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn skip_hook_suppresses_differences() {
        let e = table("T", &["A", "B"], vec![vec![Value::from("1"), Value::from("x")]]);
        let a = table("T", &["A", "B"], vec![vec![Value::from("1"), Value::from("y")]]);
        let assertion = DbAssertion::new().with_skip_hook(|column, _, _| column == "B");
        assert!(assertion.assert_equals(&e, &a).is_ok());
    }

    #[test]
    fn dataset_table_names_compare_ignoring_case_and_order() {
        let mut expected = DataSet::new();
        expected.add_table(table("ONE", &[], Vec::new())).unwrap();
        expected.add_table(table("two", &[], Vec::new())).unwrap();
        let mut actual = DataSet::new();
        actual.add_table(table("TWO", &[], Vec::new())).unwrap();
        actual.add_table(table("one", &[], Vec::new())).unwrap();
        assert!(DbAssertion::new().assert_equals_datasets(&expected, &actual).is_ok());

        let mut fewer = DataSet::new();
        fewer.add_table(table("ONE", &[], Vec::new())).unwrap();
        let err = DbAssertion::new()
            .assert_equals_datasets(&expected, &fewer)
            .unwrap_err();
        assert!(matches!(err, AssertionError::TableCountMismatch { .. }));
        assert_eq!(
            err.to_string(),
            "table count: expected <2> table(s) [ONE, TWO] but was <1> table(s) [ONE]"
        );
    }
}
