//! Sum-pivot with zero fill.
//!
//! Rows are grouped by the row-key columns (and, optionally, the column-key
//! columns); each value column is summed per group. Combinations that never
//! occur are filled with 0. Output rows are sorted by the row key.

use crate::cells::text_expr;
use crate::error::PivotError;
use polars::lazy::frame::pivot::pivot_stable;
use polars::prelude::*;

/// Joined column-key label, dropped again by the pivot.
const KEY_COLUMN: &str = "pivot_key";

/// Shown instead of a pivot table until enough columns are chosen.
pub const PIVOT_PROMPT: &str =
    "Select at least one row grouping column and one value column to build a pivot table.";

/// Pivot selections. Aggregation is always sum and the fill value always 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PivotRequest {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

impl PivotRequest {
    pub fn new<R, V>(rows: R, values: V) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
            columns: Vec::new(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_columns<C>(mut self, columns: C) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// A pivot can be built once a row key and a value column are chosen.
    pub fn is_ready(&self) -> bool {
        !self.rows.is_empty() && !self.values.is_empty()
    }

    pub fn validate(&self, df: &DataFrame) -> Result<(), PivotError> {
        for name in self.rows.iter().chain(&self.columns).chain(&self.values) {
            if df.column(name).is_err() {
                return Err(PivotError::UnknownColumn(name.clone()));
            }
        }
        for name in &self.values {
            if self.rows.contains(name) || self.columns.contains(name) {
                return Err(PivotError::ValueIsGrouping(name.clone()));
            }
            if !df.column(name)?.dtype().is_numeric() {
                return Err(PivotError::NonNumericValue(name.clone()));
            }
        }
        Ok(())
    }
}

/// Result of the pivot section of a refresh.
#[derive(Debug, Clone)]
pub enum PivotOutcome {
    Table(DataFrame),
    Prompt(String),
    Error(String),
}

/// Build the pivot table. `Ok(None)` when no row key or no value column is chosen.
pub fn pivot(df: &DataFrame, request: &PivotRequest) -> Result<Option<DataFrame>, PivotError> {
    if !request.is_ready() {
        return Ok(None);
    }
    request.validate(df)?;

    let row_keys: Vec<Expr> = request.rows.iter().map(|c| col(c.as_str())).collect();
    let mut group_keys = row_keys.clone();
    let mut lf = df.clone().lazy();

    let key_column = if request.columns.is_empty() {
        None
    } else {
        let mut key = KEY_COLUMN.to_string();
        while df.column(&key).is_ok() {
            key.push('_');
        }
        let labels: Vec<Expr> = request
            .columns
            .iter()
            .map(|c| Ok(text_expr(c, df.column(c)?.dtype())))
            .collect::<PolarsResult<_>>()?;
        lf = lf.with_column(concat_str(labels, "_", false).alias(key.as_str()));
        group_keys.push(col(key.as_str()));
        Some(key)
    };

    // group membership requires non-null keys on both axes
    let complete = request
        .rows
        .iter()
        .chain(&request.columns)
        .map(|c| col(c.as_str()).is_not_null())
        .reduce(|a, b| a.and(b));
    if let Some(complete) = complete {
        lf = lf.filter(complete);
    }

    let mut sums = Vec::with_capacity(request.values.len());
    for name in &request.values {
        let total = if df.column(name)?.dtype().is_integer() {
            DataType::Int64
        } else {
            DataType::Float64
        };
        sums.push(col(name.as_str()).cast(total).sum());
    }
    let grouped = lf.group_by(group_keys).agg(sums).collect()?;

    let table = match &key_column {
        None => grouped,
        Some(key) => spread_column_keys(&grouped, request, key)?,
    };
    let value_columns: Vec<Expr> = table
        .get_column_names()
        .into_iter()
        .filter(|name| !request.rows.iter().any(|r| r.as_str() == name.as_str()))
        .map(|name| col(name.clone()).fill_null(lit(0)))
        .collect();
    let out = table
        .lazy()
        .with_columns(value_columns)
        .sort_by_exprs(row_keys, SortMultipleOptions::default())
        .collect()?;

    tracing::debug!(
        rows = out.height(),
        columns = out.width(),
        "pivot table built"
    );
    Ok(Some(out))
}

/// One column per (value, column key) pair, named `<value>_<key label>`,
/// with labels in sorted order.
fn spread_column_keys(
    grouped: &DataFrame,
    request: &PivotRequest,
    key: &str,
) -> PolarsResult<DataFrame> {
    let mut spread = pivot_stable(
        grouped,
        [key],
        Some(request.rows.iter().map(String::as_str)),
        Some(request.values.iter().map(String::as_str)),
        true,
        None,
        Some("_"),
    )?;
    // a single value column gets bare labels; give it the same prefix as the rest
    if let [value] = request.values.as_slice() {
        let labels: Vec<String> = spread
            .get_column_names()
            .into_iter()
            .filter(|name| !request.rows.iter().any(|r| r.as_str() == name.as_str()))
            .map(|name| name.to_string())
            .collect();
        for label in labels {
            spread.rename(&label, format!("{}_{}", value, label).into())?;
        }
    }
    Ok(spread)
}

/// Run the pivot for one refresh, turning failures into a message so the
/// rest of the dashboard still renders.
pub fn pivot_section(df: &DataFrame, request: &PivotRequest) -> PivotOutcome {
    match pivot(df, request) {
        Ok(Some(table)) => PivotOutcome::Table(table),
        Ok(None) => PivotOutcome::Prompt(PIVOT_PROMPT.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "pivot failed");
            PivotOutcome::Error(format!("Could not build pivot table: {}", e))
        }
    }
}
