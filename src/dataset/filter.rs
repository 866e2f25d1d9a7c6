use anyhow::{Context, Result};
use regex::Regex;

use super::{DataSetError, Table, TableMetaData, check_row, no_such_column};
use crate::data::Value;

/// Include/exclude column patterns. `*` matches any run of characters and `?`
/// a single character; matching ignores case.
#[derive(Debug, Clone, Default)]
pub struct ColumnFilter {
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
}

impl ColumnFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn excluding<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        Self::new().with_excludes(patterns)
    }

    pub fn including<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        Self::new().with_includes(patterns)
    }

    pub fn include(mut self, pattern: &str) -> Result<Self> {
        self.includes.push(wildcard_regex(pattern)?);
        Ok(self)
    }

    pub fn exclude(mut self, pattern: &str) -> Result<Self> {
        self.excludes.push(wildcard_regex(pattern)?);
        Ok(self)
    }

    pub fn with_includes<S: AsRef<str>>(self, patterns: &[S]) -> Result<Self> {
        patterns
            .iter()
            .try_fold(self, |filter, pattern| filter.include(pattern.as_ref()))
    }

    pub fn with_excludes<S: AsRef<str>>(self, patterns: &[S]) -> Result<Self> {
        patterns
            .iter()
            .try_fold(self, |filter, pattern| filter.exclude(pattern.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    pub fn accepts(&self, column: &str) -> bool {
        let included =
            self.includes.is_empty() || self.includes.iter().any(|re| re.is_match(column));
        included && !self.excludes.iter().any(|re| re.is_match(column))
    }
}

fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let mut expr = String::from("(?i)^");
    for ch in pattern.trim().chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    expr.push('$');
    Regex::new(&expr).with_context(|| format!("Compiling column pattern '{pattern}'"))
}

/// Column-filtered view of another table. Rows are shared with the original,
/// so columns hidden from the view can still be read through
/// [`Table::original`].
pub struct FilteredTable<'a> {
    inner: &'a dyn Table,
    metadata: TableMetaData,
}

impl<'a> FilteredTable<'a> {
    pub fn new(inner: &'a dyn Table, filter: &ColumnFilter) -> Self {
        let source = inner.metadata();
        let columns = source
            .columns
            .iter()
            .filter(|column| filter.accepts(&column.name))
            .cloned()
            .collect();
        let primary_keys = source
            .primary_keys
            .iter()
            .filter(|key| filter.accepts(key))
            .cloned()
            .collect();
        let metadata = TableMetaData {
            table_name: source.table_name.clone(),
            columns,
            primary_keys,
        };
        Self { inner, metadata }
    }
}

impl Table for FilteredTable<'_> {
    fn metadata(&self) -> &TableMetaData {
        &self.metadata
    }

    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn value(&self, row: usize, column: &str) -> Result<Value, DataSetError> {
        check_row(self, row)?;
        if self.metadata.column_index(column).is_none() {
            return Err(no_such_column(self, column));
        }
        self.inner.value(row, column)
    }

    fn original(&self) -> Option<&dyn Table> {
        Some(self.inner)
    }
}
