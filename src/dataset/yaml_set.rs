//! YAML datasets: a mapping from table name to a list of row mappings.
//!
//! ```yaml
//! ORDERS:
//!   - ID: 1
//!     AMOUNT: 12.5
//!   - ID: 2
//! ```
//!
//! Columns are the union of the row keys in first-seen order; a key missing
//! from a row reads as null.

use std::{fs::File, io::Write, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use encoding_rs::Encoding;
use log::info;
use serde_yaml::{Mapping, Number, Value as YamlValue};

use super::{Column, DataSet, DefaultTable, Table, TableMetaData};
use crate::{data::Value, io_utils};

pub fn load_yaml_dataset(path: &Path, encoding: &'static Encoding) -> Result<DataSet> {
    let text = io_utils::read_text(path, encoding)?;
    let dataset =
        parse_yaml_dataset(&text).with_context(|| format!("Parsing YAML dataset {path:?}"))?;
    info!("Loaded {} table(s) from {:?}", dataset.len(), path);
    Ok(dataset)
}

pub fn parse_yaml_dataset(text: &str) -> Result<DataSet> {
    let document: YamlValue = serde_yaml::from_str(text).context("Parsing YAML")?;
    let mut dataset = DataSet::new();
    let tables = match document {
        YamlValue::Null => return Ok(dataset),
        YamlValue::Mapping(mapping) => mapping,
        other => bail!("YAML dataset must be a mapping of table names, found {other:?}"),
    };

    for (key, rows) in tables {
        let table_name = yaml_key(&key)?;
        let rows = match rows {
            YamlValue::Null => Vec::new(),
            YamlValue::Sequence(rows) => rows,
            other => bail!("Table '{table_name}' must be a list of rows, found {other:?}"),
        };

        let mut column_names: Vec<String> = Vec::new();
        let mut parsed_rows: Vec<Vec<(String, Value)>> = Vec::with_capacity(rows.len());
        for (idx, row) in rows.into_iter().enumerate() {
            let YamlValue::Mapping(row) = row else {
                bail!("Row {} of table '{table_name}' must be a mapping", idx + 1);
            };
            let mut cells = Vec::with_capacity(row.len());
            for (column, value) in row {
                let column = yaml_key(&column)?;
                if !column_names.iter().any(|c| c.eq_ignore_ascii_case(&column)) {
                    column_names.push(column.clone());
                }
                let value = yaml_to_value(value).with_context(|| {
                    format!("Row {} column '{column}' of table '{table_name}'", idx + 1)
                })?;
                cells.push((column, value));
            }
            parsed_rows.push(cells);
        }

        let columns = column_names.iter().map(Column::unknown).collect();
        let mut table = DefaultTable::new(TableMetaData::new(table_name.clone(), columns));
        for cells in parsed_rows {
            let values = column_names
                .iter()
                .map(|name| {
                    cells
                        .iter()
                        .find(|(column, _)| column.eq_ignore_ascii_case(name))
                        .map(|(_, value)| value.clone())
                        .unwrap_or(Value::Null)
                })
                .collect();
            table.add_row(values)?;
        }
        dataset
            .add_table(table)
            .with_context(|| format!("Adding table '{table_name}'"))?;
    }
    Ok(dataset)
}

fn yaml_key(key: &YamlValue) -> Result<String> {
    match key {
        YamlValue::String(s) => Ok(s.clone()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        other => Err(anyhow!("Unsupported YAML key {other:?}")),
    }
}

fn yaml_to_value(value: YamlValue) -> Result<Value> {
    Ok(match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Boolean(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        YamlValue::String(s) => Value::String(s),
        other => bail!("Unsupported YAML value {other:?}"),
    })
}

fn value_to_yaml(value: &Value) -> YamlValue {
    match value {
        Value::Null => YamlValue::Null,
        Value::Boolean(b) => YamlValue::Bool(*b),
        Value::Integer(i) => YamlValue::Number(Number::from(*i)),
        Value::Float(f) => YamlValue::Number(Number::from(*f)),
        other => YamlValue::String(other.as_display()),
    }
}

pub fn yaml_dataset_to_string(dataset: &DataSet) -> Result<String> {
    let mut document = Mapping::new();
    for table in dataset.tables() {
        let names = table.metadata().column_names();
        let mut rows = Vec::with_capacity(table.row_count());
        for row in 0..table.row_count() {
            let mut mapping = Mapping::new();
            for name in &names {
                let value = table.value(row, name)?;
                if !value.is_null() {
                    mapping.insert(YamlValue::String(name.clone()), value_to_yaml(&value));
                }
            }
            rows.push(YamlValue::Mapping(mapping));
        }
        document.insert(
            YamlValue::String(table.table_name().to_string()),
            YamlValue::Sequence(rows),
        );
    }
    serde_yaml::to_string(&YamlValue::Mapping(document)).context("Serializing YAML dataset")
}

pub fn write_yaml_dataset(dataset: &DataSet, path: &Path) -> Result<()> {
    let serialized = yaml_dataset_to_string(dataset)?;
    let mut file = File::create(path).with_context(|| format!("Creating YAML file {path:?}"))?;
    file.write_all(serialized.as_bytes())?;
    file.flush()?;
    info!("Wrote {} table(s) to {:?}", dataset.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS: &str = "\
ORDERS:
  - ID: 1
    AMOUNT: 12.5
    NOTE: first
  - ID: 2
    SHIPPED: true
EMPTY: []
";

    #[test]
    fn columns_are_the_union_of_row_keys() {
        let dataset = parse_yaml_dataset(ORDERS).unwrap();
        assert_eq!(dataset.table_names(), vec!["ORDERS", "EMPTY"]);

        let orders = dataset.table("orders").unwrap();
        assert_eq!(
            orders.metadata().column_names(),
            vec!["ID", "AMOUNT", "NOTE", "SHIPPED"]
        );
        assert_eq!(orders.value(0, "AMOUNT").unwrap(), Value::Float(12.5));
        assert_eq!(orders.value(1, "NOTE").unwrap(), Value::Null);
        assert_eq!(orders.value(1, "SHIPPED").unwrap(), Value::Boolean(true));

        let empty = dataset.table("EMPTY").unwrap();
        assert_eq!(empty.row_count(), 0);
        assert!(empty.metadata().columns.is_empty());
    }

    #[test]
    fn non_mapping_rows_are_rejected() {
        let err = parse_yaml_dataset("T:\n  - 1\n").unwrap_err();
        assert!(err.to_string().contains("must be a mapping"));
    }

    #[test]
    fn serialized_dataset_parses_back() {
        let dataset = parse_yaml_dataset(ORDERS).unwrap();
        let text = yaml_dataset_to_string(&dataset).unwrap();
        let reparsed = parse_yaml_dataset(&text).unwrap();
        let orders = reparsed.table("ORDERS").unwrap();
        assert_eq!(orders.row_count(), 2);
        assert_eq!(orders.value(0, "NOTE").unwrap(), Value::from("first"));
        assert_eq!(orders.value(1, "ID").unwrap(), Value::Integer(2));
    }
}
