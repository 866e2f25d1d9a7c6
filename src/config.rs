//! YAML comparison configuration.
//!
//! ```yaml
//! mode: collect
//! tables:
//!   ORDERS:
//!     exclude: [UPDATED_AT]
//!     sort_by: [ID]
//!     additional_columns: [ID]
//!   "*":
//!     exclude: [ROW_VERSION]
//! tolerances:
//!   - { table: ORDERS, column: AMOUNT, delta: 0.01 }
//! replacements:
//!   "[NULL]": null
//! ```
//!
//! Options under `"*"` apply to tables without an entry of their own.

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    assertion::{InvalidPrecision, Precision, ToleratedDelta, ToleratedDeltaMap},
    data::Value,
    dataset::filter::ColumnFilter,
};

pub const ALL_TABLES: &str = "*";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureMode {
    #[default]
    FailFast,
    Collect,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableOptions {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub sort_by: Vec<String>,
    pub additional_columns: Vec<String>,
}

impl TableOptions {
    pub fn column_filter(&self) -> Result<ColumnFilter> {
        ColumnFilter::new()
            .with_includes(&self.include)?
            .with_excludes(&self.exclude)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToleranceEntry {
    pub table: String,
    pub column: String,
    pub delta: Decimal,
    #[serde(default)]
    pub percentage: bool,
}

impl ToleranceEntry {
    pub fn to_tolerated_delta(&self) -> Result<ToleratedDelta, InvalidPrecision> {
        Ok(ToleratedDelta::new(
            self.table.clone(),
            self.column.clone(),
            Precision::new(self.delta, self.percentage)?,
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparisonConfig {
    pub mode: FailureMode,
    pub tables: BTreeMap<String, TableOptions>,
    pub tolerances: Vec<ToleranceEntry>,
    pub replacements: BTreeMap<String, Option<String>>,
}

impl ComparisonConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: ComparisonConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        config
            .tolerated_delta_map()
            .with_context(|| format!("Validating tolerances in {path:?}"))?;
        Ok(config)
    }

    /// Options for `table`, falling back to the `"*"` entry.
    pub fn table_options(&self, table: &str) -> TableOptions {
        self.tables
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(table))
            .or_else(|| self.tables.get_key_value(ALL_TABLES))
            .map(|(_, options)| options.clone())
            .unwrap_or_default()
    }

    pub fn tolerated_delta_map(&self) -> Result<ToleratedDeltaMap, InvalidPrecision> {
        let mut map = ToleratedDeltaMap::new();
        for entry in &self.tolerances {
            map.add(entry.to_tolerated_delta()?);
        }
        Ok(map)
    }

    /// Whole-value replacements; a `null` target reads as [`Value::Null`].
    pub fn replacement_pairs(&self) -> Vec<(String, Value)> {
        self.replacements
            .iter()
            .map(|(from, to)| (from.clone(), Value::from(to.clone())))
            .collect()
    }
}
