//! Column roles, recomputed from the live table on every refresh.

use crate::cells::is_date_eligible;
use polars::prelude::*;
use std::fmt;

/// How a column can be used by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    /// Any polars numeric dtype (integers, floats, decimals).
    Numeric,
    /// Everything that is neither numeric nor temporal (text, booleans, ...).
    Categorical,
    /// Date or Datetime dtype.
    DateLike,
}

impl ColumnRole {
    pub fn of(dtype: &DataType) -> Self {
        if dtype.is_numeric() {
            Self::Numeric
        } else if matches!(dtype, DataType::Date | DataType::Datetime(_, _)) {
            Self::DateLike
        } else {
            Self::Categorical
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::DateLike => "date",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Every column with its role, in table order.
pub fn classify(df: &DataFrame) -> Vec<(String, ColumnRole)> {
    df.get_columns()
        .iter()
        .map(|c| (c.name().to_string(), ColumnRole::of(c.dtype())))
        .collect()
}

/// Role of one column, if it exists.
pub fn role_of(df: &DataFrame, column: &str) -> Option<ColumnRole> {
    df.column(column).ok().map(|c| ColumnRole::of(c.dtype()))
}

/// Columns usable as chart values and pivot values.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    classify(df)
        .into_iter()
        .filter(|(_, role)| *role == ColumnRole::Numeric)
        .map(|(name, _)| name)
        .collect()
}

/// Columns usable as chart categories: everything that is not numeric.
pub fn category_columns(df: &DataFrame) -> Vec<String> {
    classify(df)
        .into_iter()
        .filter(|(_, role)| *role != ColumnRole::Numeric)
        .map(|(name, _)| name)
        .collect()
}

/// Columns offered as date filter candidates: temporal columns and text
/// columns (dates are often stored as text before coercion).
pub fn date_candidates(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| is_date_eligible(c.dtype()))
        .map(|c| c.name().to_string())
        .collect()
}
