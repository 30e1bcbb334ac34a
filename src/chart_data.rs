//! Prepare chart data from the filtered table: per-category sums for pie and
//! bar charts, and (x, y) points for line charts.

use crate::cells::{column_texts, datetime_values, numeric_values};
use crate::classify::{role_of, ColumnRole};
use crate::error::ChartError;
use chrono::DateTime;
use polars::prelude::*;
use std::collections::HashMap;

/// What to plot. Pie and bar charts aggregate a numeric column per category;
/// line charts plot one point per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartRequest {
    Pie { category: String, value: String },
    Bar { x: String, y: String },
    Line { x: String, y: String },
}

impl ChartRequest {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Pie { .. } => "pie",
            Self::Bar { .. } => "bar",
            Self::Line { .. } => "line",
        }
    }

    /// Category (pie, bar) or x-axis (line) column.
    pub fn x_column(&self) -> &str {
        match self {
            Self::Pie { category, .. } => category,
            Self::Bar { x, .. } | Self::Line { x, .. } => x,
        }
    }

    /// Value (pie) or y-axis (bar, line) column.
    pub fn y_column(&self) -> &str {
        match self {
            Self::Pie { value, .. } => value,
            Self::Bar { y, .. } | Self::Line { y, .. } => y,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::Pie { category, value } => format!("{} by {}", value, category),
            Self::Bar { x, y } => format!("{} by {}", y, x),
            Self::Line { x, y } => format!("{} over {}", y, x),
        }
    }

    pub fn validate(&self, df: &DataFrame) -> Result<(), ChartError> {
        let x = self.x_column();
        let y = self.y_column();
        let x_role = role_of(df, x).ok_or_else(|| ChartError::UnknownColumn(x.to_string()))?;
        let y_role = role_of(df, y).ok_or_else(|| ChartError::UnknownColumn(y.to_string()))?;
        if y_role != ColumnRole::Numeric {
            return Err(ChartError::NotNumeric(y.to_string()));
        }
        if !matches!(self, Self::Line { .. }) && x_role == ColumnRole::Numeric {
            return Err(ChartError::NotCategorical(x.to_string()));
        }
        Ok(())
    }
}

/// How line-chart x values map back to axis labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XAxisKind {
    Numeric,
    /// x = days since the Unix epoch
    Date,
    /// x = microseconds since the Unix epoch
    Datetime,
    /// x = position of the value in `ChartData::Line::categories`
    Category,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Pie {
        title: String,
        slices: Vec<(String, f64)>,
    },
    Bar {
        title: String,
        x_label: String,
        y_label: String,
        bars: Vec<(String, f64)>,
    },
    Line {
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
        x_kind: XAxisKind,
        categories: Vec<String>,
    },
}

impl ChartData {
    pub fn title(&self) -> &str {
        match self {
            Self::Pie { title, .. } | Self::Bar { title, .. } | Self::Line { title, .. } => title,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Pie { slices, .. } => slices.is_empty(),
            Self::Bar { bars, .. } => bars.is_empty(),
            Self::Line { points, .. } => points.is_empty(),
        }
    }
}

/// Build the series for one chart request.
pub fn chart_data(df: &DataFrame, request: &ChartRequest) -> Result<ChartData, ChartError> {
    request.validate(df)?;
    let title = request.title();
    let data = match request {
        ChartRequest::Pie { category, value } => ChartData::Pie {
            title,
            slices: category_sums(df, category, value)?,
        },
        ChartRequest::Bar { x, y } => ChartData::Bar {
            title,
            x_label: x.clone(),
            y_label: y.clone(),
            bars: category_sums(df, x, y)?,
        },
        ChartRequest::Line { x, y } => {
            let (points, x_kind, categories) = line_points(df, x, y)?;
            ChartData::Line {
                title,
                x_label: x.clone(),
                y_label: y.clone(),
                points,
                x_kind,
                categories,
            }
        }
    };
    tracing::debug!(kind = request.kind_name(), empty = data.is_empty(), "chart data prepared");
    Ok(data)
}

/// Sum of `value` per distinct `category`, in first-appearance order.
/// Null categories are skipped; null values count as 0.
fn category_sums(df: &DataFrame, category: &str, value: &str) -> Result<Vec<(String, f64)>, ChartError> {
    let labels = column_texts(df.column(category)?.as_materialized_series())?;
    let values = numeric_values(df.column(value)?.as_materialized_series())?;

    let mut order: Vec<(String, f64)> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();
    for (label, v) in labels.into_iter().zip(values) {
        let Some(label) = label else { continue };
        let idx = *slot.entry(label.clone()).or_insert_with(|| {
            order.push((label, 0.0));
            order.len() - 1
        });
        order[idx].1 += v.unwrap_or(0.0);
    }
    Ok(order)
}

type LinePoints = (Vec<(f64, f64)>, XAxisKind, Vec<String>);

/// One point per row in row order; rows with a null x or y are skipped.
fn line_points(df: &DataFrame, x: &str, y: &str) -> Result<LinePoints, ChartError> {
    let x_series = df.column(x)?.as_materialized_series();
    let ys = numeric_values(df.column(y)?.as_materialized_series())?;

    let mut categories = Vec::new();
    let (xs, kind): (Vec<Option<f64>>, XAxisKind) = match ColumnRole::of(x_series.dtype()) {
        ColumnRole::Numeric => (numeric_values(x_series)?, XAxisKind::Numeric),
        ColumnRole::DateLike => {
            let values = datetime_values(x_series)?.unwrap_or_default();
            if matches!(x_series.dtype(), DataType::Date) {
                let days = values
                    .iter()
                    .map(|v| v.map(|dt| dt.and_utc().timestamp().div_euclid(86_400) as f64))
                    .collect();
                (days, XAxisKind::Date)
            } else {
                let micros = values
                    .iter()
                    .map(|v| v.map(|dt| dt.and_utc().timestamp_micros() as f64))
                    .collect();
                (micros, XAxisKind::Datetime)
            }
        }
        ColumnRole::Categorical => {
            let mut slot: HashMap<String, usize> = HashMap::new();
            let positions = column_texts(x_series)?
                .into_iter()
                .map(|label| {
                    label.map(|label| {
                        *slot.entry(label.clone()).or_insert_with(|| {
                            categories.push(label);
                            categories.len() - 1
                        }) as f64
                    })
                })
                .collect();
            (positions, XAxisKind::Category)
        }
    };

    let points = xs
        .into_iter()
        .zip(ys)
        .filter_map(|(x, y)| Some((x?, y?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    Ok((points, kind, categories))
}

/// Axis label for a line-chart x value.
pub fn format_x_label(kind: XAxisKind, value: f64, categories: &[String]) -> String {
    match kind {
        XAxisKind::Numeric => crate::statistics::format_number(value),
        XAxisKind::Date => DateTime::from_timestamp((value.round() as i64) * 86_400, 0)
            .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        XAxisKind::Datetime => DateTime::from_timestamp_micros(value.round() as i64)
            .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default(),
        XAxisKind::Category => {
            let idx = value.round();
            if idx >= 0.0 && (value - idx).abs() < 1e-9 {
                categories.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales() -> DataFrame {
        df!(
            "Region" => ["N", "S", "N"],
            "Sales" => [10i64, 20, 30],
            "Day" => [1i64, 2, 3]
        )
        .unwrap()
    }

    #[test]
    fn pie_sums_per_category_in_first_appearance_order() {
        let request = ChartRequest::Pie {
            category: "Region".into(),
            value: "Sales".into(),
        };
        let data = chart_data(&sales(), &request).unwrap();
        assert_eq!(
            data,
            ChartData::Pie {
                title: "Sales by Region".into(),
                slices: vec![("N".into(), 40.0), ("S".into(), 20.0)],
            }
        );
    }

    #[test]
    fn bar_requires_category_and_numeric_columns() {
        let request = ChartRequest::Bar {
            x: "Sales".into(),
            y: "Day".into(),
        };
        assert!(matches!(
            chart_data(&sales(), &request),
            Err(ChartError::NotCategorical(c)) if c == "Sales"
        ));
        let request = ChartRequest::Bar {
            x: "Region".into(),
            y: "Region".into(),
        };
        assert!(matches!(
            chart_data(&sales(), &request),
            Err(ChartError::NotNumeric(_))
        ));
        let request = ChartRequest::Bar {
            x: "Nope".into(),
            y: "Sales".into(),
        };
        assert!(matches!(
            chart_data(&sales(), &request),
            Err(ChartError::UnknownColumn(c)) if c == "Nope"
        ));
    }

    #[test]
    fn line_over_numeric_x_keeps_row_order() {
        let request = ChartRequest::Line {
            x: "Day".into(),
            y: "Sales".into(),
        };
        match chart_data(&sales(), &request).unwrap() {
            ChartData::Line { points, x_kind, .. } => {
                assert_eq!(points, vec![(1.0, 10.0), (2.0, 20.0), (3.0, 30.0)]);
                assert_eq!(x_kind, XAxisKind::Numeric);
            }
            other => panic!("expected line data, got {:?}", other),
        }
    }

    #[test]
    fn line_over_text_x_uses_positions() {
        let request = ChartRequest::Line {
            x: "Region".into(),
            y: "Sales".into(),
        };
        match chart_data(&sales(), &request).unwrap() {
            ChartData::Line {
                points,
                x_kind,
                categories,
                ..
            } => {
                assert_eq!(points, vec![(0.0, 10.0), (1.0, 20.0), (0.0, 30.0)]);
                assert_eq!(x_kind, XAxisKind::Category);
                assert_eq!(categories, vec!["N", "S"]);
                assert_eq!(format_x_label(x_kind, 1.0, &categories), "S");
                assert_eq!(format_x_label(x_kind, 0.5, &categories), "");
            }
            other => panic!("expected line data, got {:?}", other),
        }
    }

    #[test]
    fn line_skips_null_points() {
        let df = df!(
            "x" => [Some(1.0f64), None, Some(3.0)],
            "y" => [Some(1.0f64), Some(2.0), None]
        )
        .unwrap();
        let request = ChartRequest::Line {
            x: "x".into(),
            y: "y".into(),
        };
        let data = chart_data(&df, &request).unwrap();
        assert!(matches!(data, ChartData::Line { ref points, .. } if points == &vec![(1.0, 1.0)]));
    }

    #[test]
    fn date_labels_format_as_days() {
        assert_eq!(format_x_label(XAxisKind::Date, 0.0, &[]), "1970-01-01");
        assert_eq!(format_x_label(XAxisKind::Date, 18628.0, &[]), "2021-01-01");
    }
}
