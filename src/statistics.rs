//! Summary statistics for the filtered table: describe-style moments and
//! quartiles for numeric columns, distinct-value counts for the rest.

use crate::cells::{column_texts, numeric_values};
use crate::classify::ColumnRole;
use polars::prelude::*;
use std::collections::HashSet;

/// Label column of [`Summary::to_frame`].
pub const STATISTIC_COLUMN: &str = "statistic";

const NUMERIC_ROWS: [&str; 7] = ["mean", "std", "min", "25%", "50%", "75%", "max"];
const CATEGORICAL_ROWS: [&str; 3] = ["unique", "top", "freq"];

// column names of the value-count frame
const VALUE: &str = "value";
const COUNT: &str = "count";

/// Descriptive statistics for every column of a table, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub row_count: usize,
    pub columns: Vec<ColumnSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub role: ColumnRole,
    /// Non-null cells.
    pub count: usize,
    pub stats: ColumnStats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnStats {
    Numeric(NumericStatistics),
    Categorical(CategoricalStatistics),
}

/// Undefined statistics (empty column, std of a single value) are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericStatistics {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoricalStatistics {
    pub unique_count: usize,
    /// Most frequent value; the earliest one wins ties.
    pub top: Option<String>,
    pub freq: Option<usize>,
}

impl Summary {
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn has_numeric(&self) -> bool {
        self.columns
            .iter()
            .any(|c| matches!(c.stats, ColumnStats::Numeric(_)))
    }

    fn has_categorical(&self) -> bool {
        self.columns
            .iter()
            .any(|c| matches!(c.stats, ColumnStats::Categorical(_)))
    }

    /// Row labels of [`Summary::to_frame`], in order.
    pub fn row_labels(&self) -> Vec<&'static str> {
        let mut labels = vec!["count"];
        if self.has_categorical() {
            labels.extend(CATEGORICAL_ROWS);
        }
        if self.has_numeric() {
            labels.extend(NUMERIC_ROWS);
        }
        labels
    }

    /// Render as a table: a label column plus one text column per input
    /// column. Cells are null where a statistic does not apply.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let labels = self.row_labels();
        let mut label_name = STATISTIC_COLUMN.to_string();
        while self.columns.iter().any(|c| c.name == label_name) {
            label_name.push('_');
        }

        let mut columns: Vec<Column> = Vec::with_capacity(self.columns.len() + 1);
        columns.push(Series::new(label_name.as_str().into(), &labels).into());
        for col in &self.columns {
            let cells: Vec<Option<String>> = labels.iter().map(|l| col.cell(l)).collect();
            columns.push(Series::new(col.name.as_str().into(), cells).into());
        }
        DataFrame::new(columns)
    }
}

impl ColumnSummary {
    /// One statistic rendered to text, or `None` when it does not apply.
    pub fn cell(&self, label: &str) -> Option<String> {
        if label == "count" {
            return Some(self.count.to_string());
        }
        match &self.stats {
            ColumnStats::Numeric(n) => {
                let value = match label {
                    "mean" => n.mean,
                    "std" => n.std,
                    "min" => n.min,
                    "25%" => n.q25,
                    "50%" => n.median,
                    "75%" => n.q75,
                    "max" => n.max,
                    _ => return None,
                };
                value.map(format_number)
            }
            ColumnStats::Categorical(c) => match label {
                "unique" => Some(c.unique_count.to_string()),
                "top" => c.top.clone(),
                "freq" => c.freq.map(|f| f.to_string()),
                _ => None,
            },
        }
    }
}

/// Format a statistic with up to six decimals and no trailing zeros.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let text = format!("{:.6}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Describe every column. Numeric columns get moments and quartiles; all
/// other columns get distinct-value counts.
pub fn summarize(df: &DataFrame) -> PolarsResult<Summary> {
    let mut columns = Vec::with_capacity(df.width());
    for col in df.get_columns() {
        let series = col.as_materialized_series();
        let role = ColumnRole::of(series.dtype());
        let summary = if role == ColumnRole::Numeric {
            let values = Series::new(series.name().clone(), numeric_values(series)?).drop_nulls();
            ColumnSummary {
                name: series.name().to_string(),
                role,
                count: values.len(),
                stats: ColumnStats::Numeric(compute_numeric_stats(&values)?),
            }
        } else {
            let texts = Series::new(VALUE.into(), column_texts(series)?).drop_nulls();
            ColumnSummary {
                name: series.name().to_string(),
                role,
                count: texts.len(),
                stats: ColumnStats::Categorical(compute_categorical_stats(&texts)?),
            }
        };
        columns.push(summary);
    }
    tracing::debug!(columns = columns.len(), rows = df.height(), "summary computed");
    Ok(Summary {
        row_count: df.height(),
        columns,
    })
}

/// `values` is a Float64 series without nulls.
fn compute_numeric_stats(values: &Series) -> PolarsResult<NumericStatistics> {
    if values.is_empty() {
        return Ok(NumericStatistics::default());
    }
    let ca = values.f64()?;
    let quantile = |q: f64| ca.quantile(q, QuantileMethod::Linear);
    Ok(NumericStatistics {
        mean: values.mean(),
        std: values.std(1),
        min: values.min::<f64>()?,
        q25: quantile(0.25)?,
        median: quantile(0.5)?,
        q75: quantile(0.75)?,
        max: values.max::<f64>()?,
    })
}

/// `values` is a String series named [`VALUE`] without nulls.
fn compute_categorical_stats(values: &Series) -> PolarsResult<CategoricalStatistics> {
    let counts = values.value_counts(false, false, COUNT.into(), false)?;
    let unique_count = counts.height();
    let freq = counts
        .column(COUNT)?
        .as_materialized_series()
        .max::<usize>()?;
    let Some(freq) = freq else {
        return Ok(CategoricalStatistics::default());
    };

    // ties go to the value seen first
    let texts = counts.column(VALUE)?.as_materialized_series();
    let mut tied = HashSet::new();
    for (text, count) in texts
        .str()?
        .iter()
        .zip(counts.column(COUNT)?.as_materialized_series().idx()?.iter())
    {
        if let (Some(text), Some(count)) = (text, count) {
            if count as usize == freq {
                tied.insert(text);
            }
        }
    }
    let top = values
        .str()?
        .iter()
        .flatten()
        .find(|text| tied.contains(text))
        .map(str::to_string);

    Ok(CategoricalStatistics {
        unique_count,
        top,
        freq: Some(freq),
    })
}
