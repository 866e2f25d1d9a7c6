use std::cmp::Ordering;

use super::{DataSetError, Table, TableMetaData, check_row, no_such_column};
use crate::data::{Value, compare_values};

/// Row-reordered view of another table.
///
/// By default rows are ordered by the display text of the sort columns, nulls
/// first. [`SortedTable::comparable`] orders by values cast through each
/// column's declared type instead. The sort is stable.
pub struct SortedTable<'a> {
    inner: &'a dyn Table,
    order: Vec<usize>,
}

impl<'a> SortedTable<'a> {
    pub fn new<S: AsRef<str>>(inner: &'a dyn Table, columns: &[S]) -> Result<Self, DataSetError> {
        Self::build(inner, columns, false)
    }

    pub fn comparable<S: AsRef<str>>(
        inner: &'a dyn Table,
        columns: &[S],
    ) -> Result<Self, DataSetError> {
        Self::build(inner, columns, true)
    }

    fn build<S: AsRef<str>>(
        inner: &'a dyn Table,
        columns: &[S],
        use_comparable: bool,
    ) -> Result<Self, DataSetError> {
        let metadata = inner.metadata();
        let sort_columns = if columns.is_empty() {
            metadata.columns.clone()
        } else {
            columns
                .iter()
                .map(|name| {
                    metadata
                        .column(name.as_ref())
                        .cloned()
                        .ok_or_else(|| no_such_column(inner, name.as_ref()))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut keys = Vec::with_capacity(inner.row_count());
        for row in 0..inner.row_count() {
            let mut key = Vec::with_capacity(sort_columns.len());
            for column in &sort_columns {
                let value = inner.value(row, &column.name)?;
                key.push(if use_comparable {
                    column.data_type.type_cast(&value)?
                } else {
                    value
                });
            }
            keys.push(key);
        }

        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by(|&a, &b| compare_keys(&keys[a], &keys[b], use_comparable));
        Ok(Self { inner, order })
    }
}

fn compare_keys(left: &[Value], right: &[Value], use_comparable: bool) -> Ordering {
    left.iter()
        .zip(right)
        .map(|(l, r)| {
            if use_comparable {
                compare_values(l, r)
            } else {
                match (l, r) {
                    (Value::Null, Value::Null) => Ordering::Equal,
                    (Value::Null, _) => Ordering::Less,
                    (_, Value::Null) => Ordering::Greater,
                    _ => l.as_display().cmp(&r.as_display()),
                }
            }
        })
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

impl Table for SortedTable<'_> {
    fn metadata(&self) -> &TableMetaData {
        self.inner.metadata()
    }

    fn row_count(&self) -> usize {
        self.order.len()
    }

    fn value(&self, row: usize, column: &str) -> Result<Value, DataSetError> {
        check_row(self, row)?;
        self.inner.value(self.order[row], column)
    }
}
