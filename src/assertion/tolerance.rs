//! Per-column numeric tolerances.

use std::{collections::HashMap, fmt, str::FromStr};

use anyhow::{Context, anyhow};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::data::parse_decimal_literal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Tolerated delta must be non-negative, got {0}")]
pub struct InvalidPrecision(pub Decimal);

/// Allowed distance between an expected and an actual number, either as an
/// absolute delta or as a percentage of the expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    delta: Decimal,
    percentage: bool,
}

impl Precision {
    pub fn new(delta: Decimal, percentage: bool) -> Result<Self, InvalidPrecision> {
        if delta.is_sign_negative() && !delta.is_zero() {
            return Err(InvalidPrecision(delta));
        }
        Ok(Self { delta, percentage })
    }

    pub fn absolute(delta: Decimal) -> Result<Self, InvalidPrecision> {
        Self::new(delta, false)
    }

    pub fn percentage(delta: Decimal) -> Result<Self, InvalidPrecision> {
        Self::new(delta, true)
    }

    pub fn delta(&self) -> Decimal {
        self.delta
    }

    pub fn is_percentage(&self) -> bool {
        self.percentage
    }

    /// True when `actual` lies within the tolerated band around `expected`.
    /// A difference too large to represent is never accepted; a percentage
    /// band too large to represent covers every difference.
    pub fn accepts(&self, expected: Decimal, actual: Decimal) -> bool {
        let Some(diff) = expected.checked_sub(actual).map(|d| d.abs()) else {
            return false;
        };
        if !self.percentage {
            return diff <= self.delta;
        }
        match (self.delta / Decimal::ONE_HUNDRED).checked_mul(expected) {
            Some(allowed) => diff <= allowed.abs(),
            None => true,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.percentage {
            write!(f, "{}%", self.delta)
        } else {
            write!(f, "{}", self.delta)
        }
    }
}

/// Parses `0.01`, `1E-5` or `5%`.
impl FromStr for Precision {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (number, percentage) = match trimmed.strip_suffix('%') {
            Some(number) => (number.trim_end(), true),
            None => (trimmed, false),
        };
        if number.is_empty() {
            return Err(anyhow!("Tolerance '{value}' is missing a delta"));
        }
        let delta = parse_decimal_literal(number)
            .with_context(|| format!("Parsing tolerance '{value}'"))?;
        Ok(Precision::new(delta, percentage)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToleratedDelta {
    pub table_name: String,
    pub column_name: String,
    pub precision: Precision,
}

impl ToleratedDelta {
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        precision: Precision,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            precision,
        }
    }

    pub fn matches(&self, table_name: &str, column_name: &str) -> bool {
        self.table_name.eq_ignore_ascii_case(table_name)
            && self.column_name.eq_ignore_ascii_case(column_name)
    }
}

/// Tolerances keyed by case-insensitive `(table, column)`; registering the
/// same pair again replaces the earlier entry.
#[derive(Debug, Clone, Default)]
pub struct ToleratedDeltaMap {
    entries: HashMap<(String, String), ToleratedDelta>,
}

impl ToleratedDeltaMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, delta: ToleratedDelta) {
        let key = (
            delta.table_name.to_ascii_uppercase(),
            delta.column_name.to_ascii_uppercase(),
        );
        self.entries.insert(key, delta);
    }

    pub fn add_tolerated_delta(
        &mut self,
        table_name: &str,
        column_name: &str,
        precision: Precision,
    ) {
        self.add(ToleratedDelta::new(table_name, column_name, precision));
    }

    pub fn find(&self, table_name: &str, column_name: &str) -> Option<&ToleratedDelta> {
        self.entries.get(&(
            table_name.to_ascii_uppercase(),
            column_name.to_ascii_uppercase(),
        ))
    }

    pub fn precision(&self, table_name: &str, column_name: &str) -> Option<Precision> {
        self.find(table_name, column_name).map(|d| d.precision)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Extend<ToleratedDelta> for ToleratedDeltaMap {
    fn extend<I: IntoIterator<Item = ToleratedDelta>>(&mut self, iter: I) {
        for delta in iter {
            self.add(delta);
        }
    }
}
