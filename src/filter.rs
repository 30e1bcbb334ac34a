//! Row filtering: column-value inclusion, date range, then free-text search.
//!
//! The inclusion and date-range masks are both computed against the input
//! table and intersected; search then runs over the rows that survive. The
//! input table is never modified and row order is preserved. Each stage is a
//! polars expression over the cells' rendered text or dates.

use crate::cells::{column_texts, datetime_values, is_date_eligible, temporal_series, text_expr};
use crate::error::FilterError;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};

const MASK: &str = "keep";

/// Date-range selection on one column. The range is inclusive at both ends
/// and only takes effect once both ends are chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub column: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            start: None,
            end: None,
        }
    }

    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    /// Both endpoints, when both are set.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.start.zip(self.end)
    }
}

/// Everything the filter stages need for one refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Column -> allowed values, compared against each cell's rendered text.
    pub columns: BTreeMap<String, BTreeSet<String>>,
    pub date_range: Option<DateRange>,
    pub search: Option<String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict `column` to `values`. An empty iterator selects no rows.
    pub fn with_values<I, S>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns
            .entry(column.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// The search term, if one is active. An empty term is inactive.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|t| !t.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.date_range.is_none() && self.search_term().is_none()
    }

    /// Check that every referenced column exists and that the date column can hold dates.
    pub fn validate(&self, df: &DataFrame) -> Result<(), FilterError> {
        for column in self.columns.keys() {
            if df.column(column).is_err() {
                return Err(FilterError::UnknownColumn(column.clone()));
            }
        }
        if let Some(range) = &self.date_range {
            let col = df
                .column(&range.column)
                .map_err(|_| FilterError::UnknownColumn(range.column.clone()))?;
            if !is_date_eligible(col.dtype()) {
                return Err(FilterError::NotDateEligible(range.column.clone()));
            }
        }
        Ok(())
    }
}

/// Run all three stages and return the surviving rows as a new table.
pub fn apply(df: &DataFrame, spec: &FilterSpec) -> Result<DataFrame, FilterError> {
    apply_with_originals(df, df, spec)
}

/// Like [`apply`], but the value filters compare against `originals`: the
/// filtered columns as they were before the date column was coerced. Both
/// tables must hold the same rows in the same order.
pub fn apply_with_originals(
    df: &DataFrame,
    originals: &DataFrame,
    spec: &FilterSpec,
) -> Result<DataFrame, FilterError> {
    spec.validate(df)?;

    let mut mask: Option<BooleanChunked> = None;
    if let Some(predicate) = value_predicate(originals, spec)? {
        mask = Some(evaluate_mask(originals, predicate)?);
    }
    if let Some(range) = &spec.date_range {
        if let Some((start, end)) = range.bounds() {
            let dates = date_frame(df, &range.column)?;
            let day = col(range.column.as_str()).cast(DataType::Date);
            let predicate = day.clone().gt_eq(lit(start)).and(day.lt_eq(lit(end)));
            let date_mask = evaluate_mask(&dates, predicate)?;
            mask = Some(match mask {
                Some(m) => &m & &date_mask,
                None => date_mask,
            });
        }
    }

    let staged = match mask {
        Some(mask) => df.filter(&mask)?,
        None => df.clone(),
    };
    tracing::debug!(
        input_rows = df.height(),
        rows = staged.height(),
        "column and date filters applied"
    );

    match spec.search_term() {
        Some(term) => search(&staged, term),
        None => Ok(staged),
    }
}

/// Membership test for every column filter, combined with `and`.
fn value_predicate(df: &DataFrame, spec: &FilterSpec) -> Result<Option<Expr>, FilterError> {
    let mut predicate: Option<Expr> = None;
    for (column, allowed) in &spec.columns {
        let dtype = df
            .column(column)
            .map_err(|_| FilterError::UnknownColumn(column.clone()))?
            .dtype();
        let allowed = Series::new(
            PlSmallStr::EMPTY,
            allowed.iter().map(String::as_str).collect::<Vec<_>>(),
        );
        let test = text_expr(column, dtype).is_in(lit(allowed).implode(), false);
        predicate = Some(match predicate {
            Some(p) => p.and(test),
            None => test,
        });
    }
    Ok(predicate)
}

/// The table with `column` as dates; text columns are parsed on a copy.
fn date_frame(df: &DataFrame, column: &str) -> Result<DataFrame, FilterError> {
    let mut dates = df.select([column])?;
    coerce_date_column(&mut dates, column)?;
    Ok(dates)
}

fn evaluate_mask(df: &DataFrame, predicate: Expr) -> PolarsResult<BooleanChunked> {
    let out = df.clone().lazy().select([predicate.alias(MASK)]).collect()?;
    Ok(out.column(MASK)?.as_materialized_series().bool()?.clone())
}

/// Keep rows whose cells, rendered to text and joined with single spaces,
/// contain `term` (case-insensitive).
pub fn search(df: &DataFrame, term: &str) -> Result<DataFrame, FilterError> {
    if df.width() == 0 {
        return Ok(df.clone());
    }
    let cells: Vec<Expr> = df
        .get_columns()
        .iter()
        .map(|c| text_expr(c.name().as_str(), c.dtype()).fill_null(lit("")))
        .collect();
    let line = concat_str(cells, " ", false).str().to_lowercase();
    let out = df
        .clone()
        .lazy()
        .filter(line.str().contains_literal(lit(term.to_lowercase())))
        .collect()?;
    tracing::debug!(term, rows = out.height(), "search applied");
    Ok(out)
}

/// Coerce the designated date column of the base table in place. Text is
/// parsed cell by cell; cells that do not parse become null. Columns that
/// are already temporal are left alone.
pub fn coerce_date_column(df: &mut DataFrame, column: &str) -> Result<(), FilterError> {
    let col = df
        .column(column)
        .map_err(|_| FilterError::UnknownColumn(column.to_string()))?;
    if matches!(col.dtype(), DataType::Date | DataType::Datetime(_, _)) {
        return Ok(());
    }
    let values = datetime_values(col.as_materialized_series())?
        .ok_or_else(|| FilterError::NotDateEligible(column.to_string()))?;
    let failed = values.iter().filter(|v| v.is_none()).count() - col.null_count();
    let coerced = temporal_series(column, &values)?;
    df.with_column(coerced)?;
    tracing::debug!(column, unparsed = failed, "date column coerced");
    Ok(())
}

/// Earliest and latest date in a column (after coercion), the default range
/// offered to the user. `None` when the column holds no valid dates.
pub fn date_bounds(df: &DataFrame, column: &str) -> Result<Option<(NaiveDate, NaiveDate)>, FilterError> {
    let col = df
        .column(column)
        .map_err(|_| FilterError::UnknownColumn(column.to_string()))?;
    let values = datetime_values(col.as_materialized_series())?
        .ok_or_else(|| FilterError::NotDateEligible(column.to_string()))?;
    let dates = values.into_iter().flatten().map(|dt| dt.date());
    Ok(dates.fold(None, |acc, d| match acc {
        None => Some((d, d)),
        Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
    }))
}

/// Distinct non-null values of a column, rendered to text, in first-appearance order.
pub fn unique_values(df: &DataFrame, column: &str) -> Result<Vec<String>, FilterError> {
    let col = df
        .column(column)
        .map_err(|_| FilterError::UnknownColumn(column.to_string()))?;
    let mut seen = HashSet::new();
    Ok(column_texts(col.as_materialized_series())?
        .into_iter()
        .flatten()
        .filter(|text| seen.insert(text.clone()))
        .collect())
}
