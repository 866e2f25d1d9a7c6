//! Tabular data model shared by the loaders and the comparison engine.
//!
//! A [`Table`] exposes ordered column metadata, a row count, and value access
//! by row index and (case-insensitive) column name. [`DataSet`] is an ordered
//! collection of uniquely named tables. Views such as
//! [`filter::FilteredTable`] wrap another table and report it through
//! [`Table::original`].

pub mod csv_set;
pub mod filter;
pub mod replacement;
pub mod sorted;
pub mod yaml_set;

use std::{fmt, path::Path};

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use thiserror::Error;

use crate::{
    data::Value,
    data_type::{DataType, TypeCastError},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataSetError {
    #[error("Table '{0}' not found in dataset")]
    NoSuchTable(String),
    #[error("Column '{column}' not found in table '{table}'")]
    NoSuchColumn { table: String, column: String },
    #[error("Dataset already contains a table named '{0}'")]
    AmbiguousTableName(String),
    #[error("Row {row} is out of bounds for table '{table}' with {row_count} row(s)")]
    RowOutOfBounds {
        table: String,
        row: usize,
        row_count: usize,
    },
    #[error("Row for table '{table}' has {actual} value(s) but the table defines {expected} column(s)")]
    RowWidth {
        table: String,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    TypeCast(#[from] TypeCastError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    pub fn unknown(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetaData {
    pub table_name: String,
    pub columns: Vec<Column>,
    pub primary_keys: Vec<String>,
}

impl TableMetaData {
    pub fn new(table_name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
            primary_keys: Vec::new(),
        }
    }

    pub fn with_primary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|idx| &self.columns[idx])
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

pub trait Table {
    fn metadata(&self) -> &TableMetaData;

    fn row_count(&self) -> usize;

    fn value(&self, row: usize, column: &str) -> Result<Value, DataSetError>;

    /// The table this one is a view of, if any. Row indices of a view and its
    /// original must refer to the same rows.
    fn original(&self) -> Option<&dyn Table> {
        None
    }

    fn table_name(&self) -> &str {
        &self.metadata().table_name
    }
}

pub(crate) fn check_row(table: &dyn Table, row: usize) -> Result<(), DataSetError> {
    if row >= table.row_count() {
        return Err(DataSetError::RowOutOfBounds {
            table: table.table_name().to_string(),
            row,
            row_count: table.row_count(),
        });
    }
    Ok(())
}

pub(crate) fn no_such_column(table: &dyn Table, column: &str) -> DataSetError {
    DataSetError::NoSuchColumn {
        table: table.table_name().to_string(),
        column: column.to_string(),
    }
}

/// In-memory table.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultTable {
    metadata: TableMetaData,
    rows: Vec<Vec<Value>>,
}

impl DefaultTable {
    pub fn new(metadata: TableMetaData) -> Self {
        Self {
            metadata,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, values: Vec<Value>) -> Result<(), DataSetError> {
        if values.len() != self.metadata.columns.len() {
            return Err(DataSetError::RowWidth {
                table: self.metadata.table_name.clone(),
                expected: self.metadata.columns.len(),
                actual: values.len(),
            });
        }
        self.rows.push(values);
        Ok(())
    }

    pub fn with_rows<I, R>(mut self, rows: I) -> Result<Self, DataSetError>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = Value>,
    {
        for row in rows {
            self.add_row(row.into_iter().collect())?;
        }
        Ok(self)
    }
}

impl Table for DefaultTable {
    fn metadata(&self) -> &TableMetaData {
        &self.metadata
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn value(&self, row: usize, column: &str) -> Result<Value, DataSetError> {
        check_row(self, row)?;
        let idx = self
            .metadata
            .column_index(column)
            .ok_or_else(|| no_such_column(self, column))?;
        Ok(self.rows[row][idx].clone())
    }
}

/// Ordered collection of tables with case-insensitive, unique names.
#[derive(Default)]
pub struct DataSet {
    tables: Vec<Box<dyn Table>>,
}

impl fmt::Debug for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSet")
            .field("tables", &self.table_names())
            .finish()
    }
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table<T: Table + 'static>(&mut self, table: T) -> Result<(), DataSetError> {
        self.add_boxed_table(Box::new(table))
    }

    pub fn add_boxed_table(&mut self, table: Box<dyn Table>) -> Result<(), DataSetError> {
        if self.position(table.table_name()).is_some() {
            return Err(DataSetError::AmbiguousTableName(
                table.table_name().to_string(),
            ));
        }
        self.tables.push(table);
        Ok(())
    }

    pub fn table(&self, name: &str) -> Result<&dyn Table, DataSetError> {
        self.position(name)
            .map(|idx| self.tables[idx].as_ref())
            .ok_or_else(|| DataSetError::NoSuchTable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables
            .iter()
            .map(|t| t.table_name().to_string())
            .collect()
    }

    pub fn tables(&self) -> impl Iterator<Item = &dyn Table> {
        self.tables.iter().map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Keeps only the named tables, in the order given.
    pub fn retain_tables(self, names: &[String]) -> Result<DataSet, DataSetError> {
        let mut remaining: Vec<Option<Box<dyn Table>>> =
            self.tables.into_iter().map(Some).collect();
        let mut selected = DataSet::new();
        for name in names {
            let slot = remaining
                .iter_mut()
                .find(|slot| {
                    slot.as_ref()
                        .is_some_and(|t| t.table_name().eq_ignore_ascii_case(name))
                })
                .ok_or_else(|| DataSetError::NoSuchTable(name.clone()))?;
            if let Some(table) = slot.take() {
                selected.add_boxed_table(table)?;
            }
        }
        Ok(selected)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tables
            .iter()
            .position(|t| t.table_name().eq_ignore_ascii_case(name))
    }
}

pub fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml")
    )
}

pub fn is_csv_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("csv")
    )
}

/// Loads a dataset, choosing the format from the path: a directory is a CSV
/// dataset, `.yml`/`.yaml` a YAML dataset and `.csv` a single table.
pub fn load_dataset(path: &Path, encoding: &'static Encoding) -> Result<DataSet> {
    if path.is_dir() {
        csv_set::load_csv_dataset(path, encoding)
    } else if is_yaml_path(path) {
        yaml_set::load_yaml_dataset(path, encoding)
    } else if is_csv_path(path) {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .with_context(|| format!("Deriving a table name from {path:?}"))?;
        let table = csv_set::load_csv_table(path, name, encoding)?;
        let mut dataset = DataSet::new();
        dataset.add_table(table)?;
        Ok(dataset)
    } else {
        bail!("Unsupported dataset source {path:?}: expected a directory, .csv, .yml or .yaml")
    }
}
