//! Typed errors for the loading, filtering, chart, and pivot stages.
//!
//! Only [`LoadError`] is fatal to a session. Filter errors reject a set of
//! selections; chart and pivot errors are turned into messages by the
//! dashboard so the other sections still render.

use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// The source file could not be turned into a table.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a valid spreadsheet: {0}")]
    Excel(#[from] calamine::Error),

    #[error("not a valid CSV file: {0}")]
    Csv(#[from] PolarsError),

    #[error("{0}")]
    Sheet(String),

    #[error("unsupported file type: {0} (expected xlsx, xls, xlsm, xlsb, ods or csv)")]
    UnsupportedFormat(String),
}

/// The filter selections do not fit the table.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("column {0} cannot be used as a date column (expected a date or text column)")]
    NotDateEligible(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// The pivot selections do not fit the table.
#[derive(Error, Debug)]
pub enum PivotError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("value column {0} is not numeric and cannot be summed")]
    NonNumericValue(String),

    #[error("column {0} is used both for grouping and as a value")]
    ValueIsGrouping(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// The chart selections do not fit the table.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("column {0} is not numeric")]
    NotNumeric(String),

    #[error("column {0} is numeric; choose a category column")]
    NotCategorical(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}
