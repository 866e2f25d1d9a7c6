//! Console rendering: aligned text tables, comparison reports and per-table
//! textual diffs.

use std::borrow::Cow;
use std::fmt::Write as _;

use itertools::Itertools;
use serde::Serialize;
use similar::TextDiff;

use crate::{assertion::Difference, dataset::Table};

/// Renders `rows` under `headers` as left-aligned columns at least three
/// characters wide. Line breaks and tabs inside cells become spaces; cells
/// beyond the header count are dropped.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let header_cells = flatten_row(headers, headers.len());
    let body = rows
        .iter()
        .map(|row| flatten_row(row, headers.len()))
        .collect::<Vec<_>>();

    let mut widths = vec![3usize; header_cells.len()];
    for cells in std::iter::once(&header_cells).chain(&body) {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let rule = widths
        .iter()
        .map(|width| Cow::Owned("-".repeat(*width)))
        .collect::<Vec<_>>();

    let mut output = String::new();
    for cells in [&header_cells, &rule].into_iter().chain(&body) {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}", width = *width))
            .join("  ");
        let _ = writeln!(output, "{}", line.trim_end());
    }
    output
}

#[derive(Debug, Default, Serialize)]
pub struct ComparisonReport {
    pub tables_compared: usize,
    pub differences: Vec<Difference>,
    pub errors: Vec<String>,
}

impl ComparisonReport {
    pub fn is_clean(&self) -> bool {
        self.differences.is_empty() && self.errors.is_empty()
    }
}

pub fn render_differences(differences: &[Difference]) -> String {
    let headers = ["TABLE", "ROW", "COLUMN", "EXPECTED", "ACTUAL"]
        .map(String::from)
        .to_vec();
    let rows = differences
        .iter()
        .map(|d| {
            vec![
                d.expected_table.clone(),
                d.row.to_string(),
                d.column.clone(),
                d.expected.as_display(),
                d.actual.as_display(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

pub fn render_report(report: &ComparisonReport) -> String {
    if report.is_clean() {
        return format!(
            "No differences found in {} table(s)\n",
            report.tables_compared
        );
    }
    let mut output = String::new();
    if !report.differences.is_empty() {
        output.push_str(&render_differences(&report.differences));
    }
    for error in &report.errors {
        let _ = writeln!(output, "{error}");
    }
    let _ = writeln!(
        output,
        "{} difference(s) and {} table error(s) in {} table(s)",
        report.differences.len(),
        report.errors.len(),
        report.tables_compared
    );
    output
}

/// Unified diff of two tables, one line per row with columns in
/// case-insensitive name order. `None` when both render identically.
pub fn render_table_diff(expected: &dyn Table, actual: &dyn Table) -> Option<String> {
    let columns = expected
        .metadata()
        .column_names()
        .into_iter()
        .sorted_by_cached_key(|name| name.to_ascii_uppercase())
        .collect::<Vec<_>>();
    let expected_text = row_lines(expected, &columns);
    let actual_text = row_lines(actual, &columns);
    if expected_text == actual_text {
        return None;
    }
    let diff = TextDiff::from_lines(&expected_text, &actual_text);
    Some(
        diff.unified_diff()
            .context_radius(2)
            .header(
                &format!("expected/{}", expected.table_name()),
                &format!("actual/{}", actual.table_name()),
            )
            .to_string(),
    )
}

fn row_lines(table: &dyn Table, columns: &[String]) -> String {
    let mut output = String::new();
    for row in 0..table.row_count() {
        let line = columns
            .iter()
            .map(|column| match table.value(row, column) {
                Ok(value) => format!("{column}={value}"),
                Err(_) => format!("{column}=?"),
            })
            .join(", ");
        let _ = writeln!(output, "{line}");
    }
    output
}

fn flatten_row(row: &[String], limit: usize) -> Vec<Cow<'_, str>> {
    row.iter().take(limit).map(|cell| flatten_cell(cell)).collect()
}

fn flatten_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
