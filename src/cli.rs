use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{assertion::Precision, config::ToleranceEntry};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Load, convert and compare database test fixture datasets",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Tokenize a fixture CSV file and print its records
    Parse(ParseArgs),
    /// Compare an expected dataset against an actual one
    Compare(CompareArgs),
    /// Convert a dataset into a CSV directory or a YAML file
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Fixture CSV file to tokenize (use '-' for stdin)
    #[arg(short, long)]
    pub input: PathBuf,
    /// Output file for standard CSV (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Render records as an aligned table, treating the first record as the header
    #[arg(long)]
    pub table: bool,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Expected dataset: a CSV directory, a .csv file or a .yml/.yaml file
    #[arg(long)]
    pub expected: PathBuf,
    /// Actual dataset: a CSV directory, a .csv file or a .yml/.yaml file
    #[arg(long)]
    pub actual: PathBuf,
    /// YAML comparison config (mode, per-table options, tolerances, replacements)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Restrict the comparison to these tables (repeatable)
    #[arg(long = "table", action = clap::ArgAction::Append)]
    pub tables: Vec<String>,
    /// Compare only columns matching these wildcard patterns (repeatable)
    #[arg(long = "include", action = clap::ArgAction::Append)]
    pub include: Vec<String>,
    /// Skip columns matching these wildcard patterns (repeatable)
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude: Vec<String>,
    /// Numeric tolerance as TABLE.COLUMN=DELTA or TABLE.COLUMN=PERCENT% (repeatable)
    #[arg(long = "tolerance", value_parser = parse_tolerance, action = clap::ArgAction::Append)]
    pub tolerances: Vec<ToleranceEntry>,
    /// Columns whose values are added to failure messages (repeatable)
    #[arg(long = "additional-column", action = clap::ArgAction::Append)]
    pub additional_columns: Vec<String>,
    /// Sort both sides by all compared columns before comparing
    #[arg(long)]
    pub sort: bool,
    /// Report every difference instead of stopping at the first
    #[arg(long)]
    pub collect: bool,
    /// Report format for collected differences
    #[arg(long, value_enum, default_value_t = ReportFormat::Table)]
    pub format: ReportFormat,
    /// Print a unified diff of each mismatching table
    #[arg(long)]
    pub diff: bool,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Dataset to convert: a CSV directory, a .csv file or a .yml/.yaml file
    #[arg(short, long)]
    pub input: PathBuf,
    /// Destination CSV directory, or a .yml/.yaml file
    #[arg(short, long)]
    pub output: PathBuf,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Table,
    Json,
}

fn parse_tolerance(value: &str) -> Result<ToleranceEntry> {
    let (target, delta) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("Tolerance must look like TABLE.COLUMN=DELTA, got '{value}'"))?;
    let (table, column) = target
        .trim()
        .split_once('.')
        .filter(|(table, column)| !table.is_empty() && !column.is_empty())
        .ok_or_else(|| anyhow!("Tolerance target must be TABLE.COLUMN, got '{target}'"))?;
    let precision: Precision = delta.parse()?;
    Ok(ToleranceEntry {
        table: table.to_string(),
        column: column.to_string(),
        delta: precision.delta(),
        percentage: precision.is_percentage(),
    })
}
