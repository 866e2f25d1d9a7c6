//! CSV directory datasets.
//!
//! A dataset directory holds `table-ordering.txt`, listing one table name per
//! line, and a `<TABLE>.csv` file per table whose first record names the
//! columns. Fields are tokenized with [`CsvParser`]; the bare field `null`
//! reads as [`Value::Null`]. Columns are typed [`DataType::Unknown`].

use std::{
    borrow::Cow,
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use log::{debug, info};

use super::{Column, DataSet, DefaultTable, Table, TableMetaData};
use crate::{
    data::Value,
    data_type::DataType,
    io_utils,
    tokenizer::{CsvParser, ESCAPE, QUOTE, SEPARATOR, quote_field},
};

pub const TABLE_ORDERING_FILE: &str = "table-ordering.txt";
pub const NULL_TOKEN: &str = "null";

pub fn load_csv_dataset(dir: &Path, encoding: &'static Encoding) -> Result<DataSet> {
    let ordering_path = dir.join(TABLE_ORDERING_FILE);
    let ordering = io_utils::read_text(&ordering_path, encoding)
        .with_context(|| format!("Reading table ordering from {ordering_path:?}"))?;
    let mut dataset = DataSet::new();
    for name in ordering.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let path = dir.join(format!("{name}.csv"));
        let table = load_csv_table(&path, name, encoding)?;
        debug!(
            "Loaded table '{name}' with {} row(s) from {path:?}",
            table.row_count()
        );
        dataset
            .add_table(table)
            .with_context(|| format!("Adding table '{name}' from {dir:?}"))?;
    }
    info!("Loaded {} table(s) from {:?}", dataset.len(), dir);
    Ok(dataset)
}

pub fn load_csv_table(
    path: &Path,
    table_name: &str,
    encoding: &'static Encoding,
) -> Result<DefaultTable> {
    let mut parser = CsvParser::new();
    let records = parser
        .parse_path(path, encoding)
        .with_context(|| format!("Parsing table '{table_name}' from {path:?}"))?;
    table_from_records(table_name, records)
}

/// Builds a table from tokenized records; the first record is the header.
pub fn table_from_records(table_name: &str, records: Vec<Vec<String>>) -> Result<DefaultTable> {
    let mut records = records.into_iter();
    let header = records
        .next()
        .ok_or_else(|| anyhow!("Table '{table_name}' has no header record"))?;
    let columns = header
        .into_iter()
        .map(|name| Column::new(name, DataType::Unknown))
        .collect();
    let mut table = DefaultTable::new(TableMetaData::new(table_name, columns));
    for (idx, record) in records.enumerate() {
        let values = record
            .into_iter()
            .map(|field| {
                if field == NULL_TOKEN {
                    Value::Null
                } else {
                    Value::String(field)
                }
            })
            .collect();
        table
            .add_row(values)
            .with_context(|| format!("Row {} of table '{table_name}'", idx + 1))?;
    }
    Ok(table)
}

pub fn write_csv_dataset(dataset: &DataSet, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Creating dataset directory {dir:?}"))?;
    let ordering_path = dir.join(TABLE_ORDERING_FILE);
    let mut ordering = BufWriter::new(
        File::create(&ordering_path).with_context(|| format!("Creating {ordering_path:?}"))?,
    );
    for table in dataset.tables() {
        writeln!(ordering, "{}", table.table_name())?;
        let path = dir.join(format!("{}.csv", table.table_name()));
        let file = File::create(&path).with_context(|| format!("Creating {path:?}"))?;
        write_csv_table(table, BufWriter::new(file))
            .with_context(|| format!("Writing table '{}' to {path:?}", table.table_name()))?;
    }
    ordering.flush()?;
    info!("Wrote {} table(s) to {:?}", dataset.len(), dir);
    Ok(())
}

pub fn write_csv_table<W: Write>(table: &dyn Table, mut writer: W) -> Result<()> {
    let names = table.metadata().column_names();
    let separator = SEPARATOR.to_string();
    let header = names
        .iter()
        .map(|name| header_field(name))
        .collect::<Vec<_>>();
    writeln!(writer, "{}", header.join(&separator))?;
    for row in 0..table.row_count() {
        let mut fields = Vec::with_capacity(names.len());
        for name in &names {
            let field = match table.value(row, name)? {
                Value::Null => NULL_TOKEN.to_string(),
                other => quote_field(&other.as_display()),
            };
            fields.push(field);
        }
        writeln!(writer, "{}", fields.join(&separator))?;
    }
    writer.flush()?;
    Ok(())
}

/// Column names are written bare unless the tokenizer would read them back
/// differently.
fn header_field(name: &str) -> Cow<'_, str> {
    let needs_quotes = name.trim() != name
        || name
            .chars()
            .any(|c| c == SEPARATOR || c == QUOTE || c == ESCAPE || c.is_control());
    if needs_quotes {
        Cow::Owned(quote_field(name))
    } else {
        Cow::Borrowed(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_token_becomes_null_value() {
        let table = table_from_records(
            "T",
            vec![
                vec!["ID".into(), "NOTE".into()],
                vec!["1".into(), "null".into()],
            ],
        )
        .unwrap();
        assert_eq!(table.value(0, "NOTE").unwrap(), Value::Null);
        assert_eq!(table.value(0, "ID").unwrap(), Value::from("1"));
        assert_eq!(
            table.metadata().column("ID").unwrap().data_type,
            DataType::Unknown
        );
    }

    #[test]
    fn plain_headers_stay_bare() {
        assert_eq!(header_field("ID"), "ID");
        assert_eq!(header_field("A,B"), "\"A,B\"");
        assert_eq!(header_field(" padded"), "\" padded\"");
        assert_eq!(header_field("a\\b"), "\"a\\\\b\"");
    }

    #[test]
    fn unusual_headers_read_back_through_the_tokenizer() {
        let table = table_from_records(
            "T",
            vec![
                vec![
                    "A,B".into(),
                    " padded ".into(),
                    "say \"hi\"".into(),
                    "back\\slash".into(),
                    "two\nlines".into(),
                ],
                vec![
                    "1".into(),
                    "2".into(),
                    "3".into(),
                    "4".into(),
                    "5".into(),
                ],
            ],
        )
        .unwrap();
        let mut buffer = Vec::new();
        write_csv_table(&table, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let records = CsvParser::new().parse_str(&text, "buffer").unwrap();
        let reread = table_from_records("T", records).unwrap();
        assert_eq!(
            reread.metadata().column_names(),
            table.metadata().column_names()
        );
        assert_eq!(reread, table);
    }

    #[test]
    fn written_table_reads_back_through_the_tokenizer() {
        let table = table_from_records(
            "T",
            vec![
                vec!["ID".into(), "NOTE".into()],
                vec!["1".into(), "say \"hi\", then\nleave \\ now ".into()],
                vec!["2".into(), "null".into()],
            ],
        )
        .unwrap();
        let mut buffer = Vec::new();
        write_csv_table(&table, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let records = CsvParser::new().parse_str(&text, "buffer").unwrap();
        let reread = table_from_records("T", records).unwrap();
        assert_eq!(reread, table);
    }
}
