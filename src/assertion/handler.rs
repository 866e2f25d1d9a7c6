//! What happens when the comparison finds a mismatching cell.

use log::warn;

use super::{AssertionError, difference::Difference};
use crate::dataset::Table;

pub trait FailureHandler {
    /// Called once per mismatching cell. Returning an error ends the
    /// comparison.
    fn handle(
        &mut self,
        expected: &dyn Table,
        actual: &dyn Table,
        difference: Difference,
    ) -> Result<(), AssertionError>;
}

/// Builds the error returned for a mismatch from the difference and the
/// formatted message.
pub type FailureFactory = Box<dyn Fn(&Difference, String) -> AssertionError>;

/// Fails on the first difference.
///
/// Values of `additional_columns` are appended to the message. They are read
/// from the table a view was built on, so identifying columns that were
/// filtered out of the comparison still show up.
pub struct DefaultFailureHandler {
    additional_columns: Vec<String>,
    factory: FailureFactory,
}

impl Default for DefaultFailureHandler {
    fn default() -> Self {
        Self {
            additional_columns: Vec::new(),
            factory: Box::new(|difference, message| AssertionError::ValueMismatch {
                message,
                difference: difference.clone(),
            }),
        }
    }
}

impl DefaultFailureHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_additional_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_failure_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Difference, String) -> AssertionError + 'static,
    {
        self.factory = Box::new(factory);
        self
    }

    pub fn additional_columns(&self) -> &[String] {
        &self.additional_columns
    }

    pub fn message(
        &self,
        expected: &dyn Table,
        actual: &dyn Table,
        difference: &Difference,
    ) -> String {
        let mut location = format!(
            "table={}, row={}, col={}",
            difference.expected_table, difference.row, difference.column
        );
        if let Some(info) = self.additional_info(expected, actual, difference.row) {
            location.push_str(", Additional row info: ");
            location.push_str(&info);
        }
        format!(
            "value ({location}) expected:<{}> but was:<{}>",
            difference.expected, difference.actual
        )
    }

    fn additional_info(
        &self,
        expected: &dyn Table,
        actual: &dyn Table,
        row: usize,
    ) -> Option<String> {
        if self.additional_columns.is_empty() {
            return None;
        }
        let expected = expected.original().unwrap_or(expected);
        let actual = actual.original().unwrap_or(actual);
        let parts = self
            .additional_columns
            .iter()
            .map(|column| {
                format!(
                    "('{column}': expected=<{}>, actual=<{}>)",
                    lookup(expected, row, column),
                    lookup(actual, row, column)
                )
            })
            .collect::<Vec<_>>();
        Some(parts.join(" "))
    }
}

fn lookup(table: &dyn Table, row: usize, column: &str) -> String {
    match table.value(row, column) {
        Ok(value) => value.as_display(),
        Err(err) => {
            warn!("Additional column unavailable for failure message: {err}");
            "?".to_string()
        }
    }
}

impl FailureHandler for DefaultFailureHandler {
    fn handle(
        &mut self,
        expected: &dyn Table,
        actual: &dyn Table,
        difference: Difference,
    ) -> Result<(), AssertionError> {
        let message = self.message(expected, actual, &difference);
        Err((self.factory)(&difference, message))
    }
}

/// Records every difference in encounter order and never fails.
#[derive(Debug, Default)]
pub struct DiffCollectingFailureHandler {
    differences: Vec<Difference>,
}

impl DiffCollectingFailureHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }

    pub fn into_differences(self) -> Vec<Difference> {
        self.differences
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.differences.len()
    }
}

impl FailureHandler for DiffCollectingFailureHandler {
    fn handle(
        &mut self,
        _expected: &dyn Table,
        _actual: &dyn Table,
        difference: Difference,
    ) -> Result<(), AssertionError> {
        self.differences.push(difference);
        Ok(())
    }
}
