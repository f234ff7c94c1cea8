//! One-hot encoding shared by training and inference.
//!
//! Both sides go through [`encode_row`] followed by [`align`], so the column
//! layout a model was fitted on is exactly the layout it is queried with.

use std::collections::HashMap;

use crate::{dataset::RaceHistory, types::RaceFeatures};

pub const NUMERIC_COLUMN: &str = "grid_position";
pub const CATEGORICAL_COLUMNS: [&str; 3] = ["driver", "track", "weather"];

/// Indicator column name for `value` of categorical `column`, e.g. `driver_Hamilton`.
pub fn indicator_name(column: &str, value: &str) -> String {
    format!("{column}_{value}")
}

/// Single-row encoding: column name -> value.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow(HashMap<String, f64>);

impl EncodedRow {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.0.get(column).copied()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn encode_row(features: &RaceFeatures) -> EncodedRow {
    let mut m = HashMap::with_capacity(1 + CATEGORICAL_COLUMNS.len());
    m.insert(NUMERIC_COLUMN.to_string(), features.grid_position as f64);
    for (column, value) in CATEGORICAL_COLUMNS.iter().zip([
        &features.driver,
        &features.track,
        &features.weather,
    ]) {
        m.insert(indicator_name(column, value), 1.0);
    }
    EncodedRow(m)
}

/// A row laid out in a model's column order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow<'a> {
    pub columns: &'a [String],
    pub values: Vec<f64>,
}

impl AlignedRow<'_> {
    pub fn nonzero(&self) -> usize {
        self.values.iter().filter(|v| **v != 0.0).count()
    }
}

/// Reindex `row` onto `expected`: absent columns become 0.0, columns not in
/// `expected` are dropped, order follows `expected`.
pub fn align<'a>(row: &EncodedRow, expected: &'a [String]) -> AlignedRow<'a> {
    let values = expected
        .iter()
        .map(|k| row.get(k).unwrap_or(0.0))
        .collect();
    AlignedRow {
        columns: expected,
        values,
    }
}

/// Columns of `row` the model has never seen. Their information is lost by
/// [`align`]; callers log them.
pub fn unknown_columns<'r>(row: &'r EncodedRow, expected: &[String]) -> Vec<&'r str> {
    let mut unknown: Vec<&str> = row
        .columns()
        .filter(|c| !expected.iter().any(|e| e.as_str() == *c))
        .collect();
    unknown.sort_unstable();
    unknown
}

/// Ordered feature columns derived from a training table: the numeric column
/// first, then one indicator per distinct value, grouped by categorical
/// column and sorted within each group. No baseline level is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn fit(history: &RaceHistory) -> Self {
        let mut columns = vec![NUMERIC_COLUMN.to_string()];
        let groups = [history.drivers(), history.tracks(), history.weathers()];
        for (column, values) in CATEGORICAL_COLUMNS.iter().zip(groups) {
            columns.extend(values.iter().map(|v| indicator_name(column, v)));
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<String> {
        self.columns
    }
}
