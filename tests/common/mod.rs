#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use dataset_fixture::{
    data::Value,
    dataset::{Column, DefaultTable, TableMetaData},
};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Builds an in-memory table whose columns have unknown types.
pub fn table(name: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> DefaultTable {
    DefaultTable::new(TableMetaData::new(
        name,
        columns.iter().map(|c| Column::unknown(*c)).collect(),
    ))
    .with_rows(rows)
    .expect("rows match the column count")
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace, creating parent
    /// directories as needed, and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    /// Writes a CSV dataset directory with `table-ordering.txt` listing the
    /// tables in the given order.
    pub fn write_csv_dataset(&self, dir: &str, tables: &[(&str, &str)]) -> PathBuf {
        let ordering = tables
            .iter()
            .map(|(name, _)| format!("{name}\n"))
            .collect::<String>();
        self.write(&format!("{dir}/table-ordering.txt"), &ordering);
        for (name, contents) in tables {
            self.write(&format!("{dir}/{name}.csv"), contents);
        }
        self.path().join(dir)
    }
}
