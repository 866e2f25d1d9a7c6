use std::path::Path;

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    assertion::{
        AssertionError, DbAssertion, DefaultFailureHandler, DiffCollectingFailureHandler,
        FailureHandler,
    },
    cli::{CompareArgs, ReportFormat},
    config::{ALL_TABLES, ComparisonConfig, FailureMode, TableOptions},
    data::Value,
    dataset::{
        self, DataSet, Table,
        filter::{ColumnFilter, FilteredTable},
        replacement::ReplacementTable,
        sorted::SortedTable,
    },
    io_utils,
    report::{self, ComparisonReport},
};

pub fn execute(args: &CompareArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let config = load_config(args)?;
    let expected = load(&args.expected, encoding, &args.tables)?;
    let actual = load(&args.actual, encoding, &args.tables)?;
    info!(
        "Comparing {:?} against {:?}: {} table(s), {:?}",
        args.expected,
        args.actual,
        expected.len(),
        config.mode
    );

    let assertion = DbAssertion::new().with_tolerated_deltas(config.tolerated_delta_map()?);
    assertion.assert_same_table_names(&expected, &actual)?;

    let replacements = config.replacement_pairs();
    let mut report = ComparisonReport::default();
    let mut collector = DiffCollectingFailureHandler::new();
    for expected_table in expected.tables() {
        let name = expected_table.table_name();
        let actual_table = actual.table(name)?;
        let options = config.table_options(name);
        let plan = TablePlan {
            filter: options
                .column_filter()
                .with_context(|| format!("Building column filter for table '{name}'"))?,
            sort_by: &options.sort_by,
            sort_all: args.sort,
            replacements: &replacements,
        };
        report.tables_compared += 1;

        match config.mode {
            FailureMode::FailFast => {
                let mut handler = DefaultFailureHandler::new()
                    .with_additional_columns(options.additional_columns.iter().cloned());
                let outcome = compare_table(
                    &assertion,
                    expected_table,
                    actual_table,
                    &plan,
                    &mut handler,
                    args.diff,
                );
                if let Err(err) = outcome.result {
                    if let Some(diff) = outcome.diff {
                        print!("{diff}");
                    }
                    return Err(err.into());
                }
            }
            FailureMode::Collect => {
                let before = collector.len();
                let outcome = compare_table(
                    &assertion,
                    expected_table,
                    actual_table,
                    &plan,
                    &mut collector,
                    args.diff,
                );
                let failed = match outcome.result {
                    Ok(()) => collector.len() > before,
                    Err(err) => {
                        report.errors.push(err.to_string());
                        true
                    }
                };
                if failed && let Some(diff) = outcome.diff {
                    print!("{diff}");
                }
            }
        }
    }
    report.differences = collector.into_differences();

    match args.format {
        ReportFormat::Table => print!("{}", report::render_report(&report)),
        ReportFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Serializing comparison report")?
        ),
    }
    if !report.is_clean() {
        bail!(
            "Datasets differ: {} difference(s) and {} table error(s)",
            report.differences.len(),
            report.errors.len()
        );
    }
    info!("✓ {} table(s) match", report.tables_compared);
    Ok(())
}

/// Loads the config file, if any, and layers the command-line options on
/// top: column options are appended for every table and `--collect` wins
/// over the configured mode.
fn load_config(args: &CompareArgs) -> Result<ComparisonConfig> {
    let mut config = match &args.config {
        Some(path) => ComparisonConfig::load(path)
            .with_context(|| format!("Loading comparison config from {path:?}"))?,
        None => ComparisonConfig::default(),
    };
    if args.collect {
        config.mode = FailureMode::Collect;
    }
    config.tolerances.extend(args.tolerances.iter().cloned());
    config.tables.entry(ALL_TABLES.to_string()).or_default();
    for options in config.tables.values_mut() {
        merge_cli_options(options, args);
    }
    debug!("Effective comparison config: {config:?}");
    Ok(config)
}

fn merge_cli_options(options: &mut TableOptions, args: &CompareArgs) {
    options.include.extend(args.include.iter().cloned());
    options.exclude.extend(args.exclude.iter().cloned());
    options
        .additional_columns
        .extend(args.additional_columns.iter().cloned());
}

fn load(path: &Path, encoding: &'static Encoding, tables: &[String]) -> Result<DataSet> {
    let dataset = dataset::load_dataset(path, encoding)
        .with_context(|| format!("Loading dataset from {path:?}"))?;
    if tables.is_empty() {
        return Ok(dataset);
    }
    dataset
        .retain_tables(tables)
        .with_context(|| format!("Selecting tables from {path:?}"))
}

struct TablePlan<'a> {
    filter: ColumnFilter,
    sort_by: &'a [String],
    sort_all: bool,
    replacements: &'a [(String, Value)],
}

impl TablePlan<'_> {
    fn sort_columns(&self, table: &dyn Table) -> Option<Vec<String>> {
        if !self.sort_by.is_empty() {
            Some(self.sort_by.to_vec())
        } else if self.sort_all {
            Some(
                table
                    .metadata()
                    .column_names()
                    .into_iter()
                    .filter(|name| self.filter.accepts(name))
                    .collect(),
            )
        } else {
            None
        }
    }
}

struct TableOutcome {
    result: Result<(), AssertionError>,
    diff: Option<String>,
}

/// Compares one table pair through replacement, sorting and column
/// filtering views. Filtering is the outermost view so that failure messages
/// can still read filtered-out columns through [`Table::original`].
fn compare_table(
    assertion: &DbAssertion,
    expected: &dyn Table,
    actual: &dyn Table,
    plan: &TablePlan,
    handler: &mut dyn FailureHandler,
    with_diff: bool,
) -> TableOutcome {
    let expected_replaced =
        ReplacementTable::new(expected).with_replacement_objects(plan.replacements);
    let actual_replaced = ReplacementTable::new(actual).with_replacement_objects(plan.replacements);

    let sorted = match plan.sort_columns(&expected_replaced) {
        Some(columns) => match (
            SortedTable::new(&expected_replaced, &columns),
            SortedTable::new(&actual_replaced, &columns),
        ) {
            (Ok(e), Ok(a)) => Some((e, a)),
            (Err(err), _) | (_, Err(err)) => {
                return TableOutcome {
                    result: Err(err.into()),
                    diff: None,
                };
            }
        },
        None => None,
    };
    let (expected_base, actual_base): (&dyn Table, &dyn Table) = match &sorted {
        Some((e, a)) => (e, a),
        None => (&expected_replaced, &actual_replaced),
    };

    let expected_view = FilteredTable::new(expected_base, &plan.filter);
    let actual_view = FilteredTable::new(actual_base, &plan.filter);
    let result = assertion.assert_equals_table(&expected_view, &actual_view, handler);
    let diff = if with_diff {
        report::render_table_diff(&expected_view, &actual_view)
    } else {
        None
    };
    TableOutcome { result, diff }
}
