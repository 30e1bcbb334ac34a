//! Cell-level conversions shared by the pipeline stages: rendering a cell to
//! text, reading a column as numbers, and coercing a column to dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use polars::datatypes::TimeUnit;
use polars::prelude::*;

/// Layout of datetime cells rendered to text. Fractional seconds only appear when present.
const DATETIME_TEXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// The text a user sees for each cell of column `name`, as an expression.
/// Floats keep every significant digit; nulls stay null.
pub fn text_expr(name: &str, dtype: &DataType) -> Expr {
    match dtype {
        DataType::Datetime(_, _) => col(name).dt().to_string(DATETIME_TEXT_FORMAT),
        _ => col(name).cast(DataType::String),
    }
}

/// Every cell of a column rendered to text; `None` marks a null cell.
pub fn column_texts(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let name = series.name().clone();
    let rendered = DataFrame::new(vec![series.clone().into()])?
        .lazy()
        .select([text_expr(name.as_str(), series.dtype())])
        .collect()?;
    Ok(rendered
        .column(name.as_str())?
        .as_materialized_series()
        .str()?
        .iter()
        .map(|text| text.map(str::to_string))
        .collect())
}

/// Numeric column as f64. Nulls and NaN are `None`.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .iter()
        .map(|v| v.filter(|f| !f.is_nan()))
        .collect())
}

/// True for the dtypes a date filter may target: dates, datetimes, and text.
pub fn is_date_eligible(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Date | DataType::Datetime(_, _) | DataType::String
    )
}

/// Parses an ISO 8601 date or datetime (`2021-06-15`, `2021-06-15 13:45:00`,
/// `2021-06-15T13:45:00.250`).
pub fn parse_iso_datetime_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Parses a date or datetime string: ISO forms first, then common
/// slash, dot, and month-name layouts.
pub fn parse_naive_datetime_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(dt) = parse_iso_datetime_str(s) {
        return Some(dt);
    }
    const FORMATS: &[&str] = &["%Y/%m/%d %H:%M:%S", "%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    const DATE_FORMATS: &[&str] = &[
        "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%d %b %Y", "%d %B %Y", "%b %d, %Y", "%B %d, %Y",
    ];
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn from_timestamp(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    };
    dt.map(|dt| dt.naive_utc())
}

/// Coerce a column to datetimes, cell by cell. Cells that cannot be parsed
/// become `None`. Returns `Ok(None)` when the dtype is not date-eligible.
pub fn datetime_values(series: &Series) -> PolarsResult<Option<Vec<Option<NaiveDateTime>>>> {
    let values = match series.dtype() {
        DataType::Date => {
            let days = series.cast(&DataType::Int32)?;
            let epoch = epoch();
            days.i32()?
                .iter()
                .map(|d| {
                    d.and_then(|d| epoch.checked_add_signed(chrono::Duration::days(d as i64)))
                        .map(|date| date.and_time(NaiveTime::MIN))
                })
                .collect()
        }
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let raw = series.cast(&DataType::Int64)?;
            raw.i64()?
                .iter()
                .map(|v| v.and_then(|v| from_timestamp(v, unit)))
                .collect()
        }
        DataType::String => series
            .str()?
            .iter()
            .map(|s| s.and_then(parse_naive_datetime_str))
            .collect(),
        _ => return Ok(None),
    };
    Ok(Some(values))
}

/// Build a temporal Series from coerced values: Date when every value is at
/// midnight, Datetime (microseconds) otherwise.
pub fn temporal_series(name: &str, values: &[Option<NaiveDateTime>]) -> PolarsResult<Series> {
    let all_midnight = values.iter().flatten().all(|dt| dt.time() == NaiveTime::MIN);
    if all_midnight {
        let epoch = epoch();
        let days: Vec<Option<i32>> = values
            .iter()
            .map(|v| v.map(|dt| (dt.date() - epoch).num_days() as i32))
            .collect();
        Series::new(name.into(), days).cast(&DataType::Date)
    } else {
        let micros: Vec<Option<i64>> = values
            .iter()
            .map(|v| v.map(|dt| dt.and_utc().timestamp_micros()))
            .collect();
        Series::new(name.into(), micros).cast(&DataType::Datetime(TimeUnit::Microseconds, None))
    }
}
