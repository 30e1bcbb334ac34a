//! Loading the base table from a workbook or CSV file.

use crate::cells::{parse_iso_datetime_str, temporal_series};
use crate::error::LoadError;
use calamine::{open_workbook_auto_from_rs, Data, DataType as CalamineTrait, Range, Reader};
use chrono::NaiveDateTime;
use polars::prelude::*;
use sheetlens_cli::FileFormat;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Where the base table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// File contents handed over by the user, with the original file name.
    Upload { name: String, bytes: Vec<u8> },
    /// A file on disk: the user's path or the configured default.
    Path(PathBuf),
}

impl TableSource {
    pub fn upload(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::Upload {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// File name shown to the user and used for the export name.
    pub fn name(&self) -> String {
        match self {
            Self::Upload { name, .. } => name.clone(),
            Self::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }

    pub fn format(&self) -> Result<FileFormat, LoadError> {
        let name = self.name();
        FileFormat::from_path(Path::new(&name)).ok_or_else(|| {
            let ext = Path::new(&name)
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| name.clone());
            LoadError::UnsupportedFormat(ext)
        })
    }
}

/// Loader settings from the `[file_loading]` config section and flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadOptions {
    /// Sheet by 0-based index or by name; the first sheet when unset.
    pub excel_sheet: Option<String>,
    /// Let the CSV reader parse date and datetime columns.
    pub parse_dates: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            excel_sheet: None,
            parse_dates: true,
        }
    }
}

/// Load a source into a table. The format follows the file extension.
pub fn load(source: &TableSource, options: &LoadOptions) -> Result<DataFrame, LoadError> {
    let format = source.format()?;
    let bytes = match source {
        TableSource::Upload { bytes, .. } => bytes.clone(),
        TableSource::Path(path) => std::fs::read(path).map_err(|e| LoadError::Io {
            path: path.clone(),
            source: e,
        })?,
    };
    let df = match format {
        FileFormat::Excel => read_excel(bytes, options.excel_sheet.as_deref())?,
        FileFormat::Csv => read_csv(bytes, options.parse_dates)?,
    };
    tracing::info!(
        source = %source.name(),
        rows = df.height(),
        columns = df.width(),
        "table loaded"
    );
    Ok(df)
}

/// CSV with a header row.
pub fn read_csv(bytes: Vec<u8>, parse_dates: bool) -> Result<DataFrame, LoadError> {
    let read_options = CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|opts| opts.with_try_parse_dates(parse_dates));
    Ok(CsvReader::new(Cursor::new(bytes))
        .with_options(read_options)
        .finish()?)
}

/// One sheet of a workbook (xlsx, xls, xlsm, xlsb, ods). Row 1 is the header.
pub fn read_excel(bytes: Vec<u8>, sheet: Option<&str>) -> Result<DataFrame, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let sheet_names = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(LoadError::Sheet("workbook has no worksheets".to_string()));
    }
    let range: Range<Data> = match sheet {
        Some(sel) => match sel.parse::<usize>() {
            Ok(idx) => workbook
                .worksheet_range_at(idx)
                .ok_or_else(|| LoadError::Sheet(format!("no sheet at index {}", idx)))??,
            Err(_) => {
                if !sheet_names.iter().any(|n| n == sel) {
                    return Err(LoadError::Sheet(format!(
                        "no sheet named {:?} (sheets: {})",
                        sel,
                        sheet_names.join(", ")
                    )));
                }
                workbook.worksheet_range(sel)?
            }
        },
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| LoadError::Sheet("workbook has no first sheet".to_string()))??,
    };
    range_to_frame(&range).map_err(|e| LoadError::Sheet(format!("could not read sheet: {}", e)))
}

/// Turn a sheet's cells into a table, inferring one dtype per column.
pub fn range_to_frame(range: &Range<Data>) -> PolarsResult<DataFrame> {
    let rows: Vec<&[Data]> = range.rows().collect();
    let Some((header, body)) = rows.split_first() else {
        return DataFrame::new(vec![]);
    };
    let headers = header_names(header);
    let mut columns: Vec<Column> = Vec::with_capacity(headers.len());
    for (idx, name) in headers.iter().enumerate() {
        let cells: Vec<Option<&Data>> = body.iter().map(|row| row.get(idx)).collect();
        columns.push(column_to_series(name, &cells)?.into());
    }
    DataFrame::new(columns)
}

/// Header text per column; blanks become `column_<n>` and repeats get a `.<k>` suffix.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let text = CalamineTrait::as_string(cell).unwrap_or_else(|| cell.to_string());
            let base = if text.trim().is_empty() {
                format!("column_{}", idx + 1)
            } else {
                text
            };
            let mut name = base.clone();
            let mut k = 1;
            while !seen.insert(name.clone()) {
                name = format!("{}.{}", base, k);
                k += 1;
            }
            name
        })
        .collect()
}

/// A workbook cell reduced to what type inference needs.
#[derive(Debug, Clone, PartialEq)]
enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Temporal(NaiveDateTime),
    Text(String),
}

impl CellValue {
    fn of(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => Self::Null,
            Data::Bool(b) => Self::Bool(*b),
            Data::Int(i) => Self::Number(*i as f64),
            Data::Float(f) => Self::Number(*f),
            Data::DateTime(_) | Data::DateTimeIso(_) => cell
                .as_datetime()
                .or_else(|| cell.get_datetime_iso().and_then(parse_iso_datetime_str))
                .map(Self::Temporal)
                .unwrap_or_else(|| Self::Text(cell.to_string())),
            Data::String(s) if s.trim().is_empty() => Self::Null,
            Data::String(s) => parse_iso_datetime_str(s)
                .map(Self::Temporal)
                .unwrap_or_else(|| Self::Text(s.clone())),
            other => Self::Text(other.to_string()),
        }
    }

    fn text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(f) => Some(f.to_string()),
            Self::Temporal(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Temporal,
    Text,
}

/// A column gets a typed dtype only when every non-null cell agrees;
/// anything mixed is text.
fn infer_kind(cells: &[CellValue]) -> ColumnKind {
    let present: Vec<&CellValue> = cells.iter().filter(|c| **c != CellValue::Null).collect();
    if present.is_empty() {
        return ColumnKind::Text;
    }
    if present.iter().all(|c| matches!(c, CellValue::Bool(_))) {
        ColumnKind::Bool
    } else if present.iter().all(|c| matches!(c, CellValue::Temporal(_))) {
        ColumnKind::Temporal
    } else if present.iter().all(|c| matches!(c, CellValue::Number(_))) {
        let all_whole = present.iter().all(|c| match c {
            CellValue::Number(f) => f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15,
            _ => false,
        });
        if all_whole {
            ColumnKind::Int
        } else {
            ColumnKind::Float
        }
    } else {
        ColumnKind::Text
    }
}

fn column_to_series(name: &str, raw: &[Option<&Data>]) -> PolarsResult<Series> {
    let cells: Vec<CellValue> = raw
        .iter()
        .map(|c| c.map(CellValue::of).unwrap_or(CellValue::Null))
        .collect();
    let series = match infer_kind(&cells) {
        ColumnKind::Int => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| match c {
                    CellValue::Number(f) => Some(*f as i64),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), v)
        }
        ColumnKind::Float => {
            let v: Vec<Option<f64>> = cells
                .iter()
                .map(|c| match c {
                    CellValue::Number(f) => Some(*f),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), v)
        }
        ColumnKind::Bool => {
            let v: Vec<Option<bool>> = cells
                .iter()
                .map(|c| match c {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), v)
        }
        ColumnKind::Temporal => {
            let v: Vec<Option<NaiveDateTime>> = cells
                .iter()
                .map(|c| match c {
                    CellValue::Temporal(dt) => Some(*dt),
                    _ => None,
                })
                .collect();
            temporal_series(name, &v)?
        }
        ColumnKind::Text => {
            // text cells keep their original spelling
            let v: Vec<Option<String>> = raw
                .iter()
                .zip(&cells)
                .map(|(raw, cell)| match (raw, cell) {
                    (Some(Data::String(s)), CellValue::Temporal(_)) => Some(s.clone()),
                    _ => cell.text(),
                })
                .collect();
            Series::new(name.into(), v)
        }
    };
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: Vec<Vec<Data>>) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.into_iter().enumerate() {
            for (c, cell) in row.into_iter().enumerate() {
                range.set_value((r as u32, c as u32), cell);
            }
        }
        range
    }

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    #[test]
    fn infers_column_types_from_cells() {
        let range = sheet(vec![
            vec![s("Region"), s("Sales"), s("Price"), s("Active"), s("When")],
            vec![s("N"), Data::Float(10.0), Data::Float(1.5), Data::Bool(true), s("2021-01-01")],
            vec![s("S"), Data::Int(20), Data::Float(2.0), Data::Bool(false), s("2021-02-01")],
        ]);
        let df = range_to_frame(&range).unwrap();
        assert_eq!(df.shape(), (2, 5));
        assert_eq!(df.column("Region").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("Sales").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("Price").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Active").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(df.column("When").unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn mixed_columns_fall_back_to_text() {
        let range = sheet(vec![
            vec![s("x")],
            vec![Data::Float(1.0)],
            vec![s("n/a")],
            vec![Data::Empty],
        ]);
        let df = range_to_frame(&range).unwrap();
        let x = df.column("x").unwrap();
        assert_eq!(x.dtype(), &DataType::String);
        assert_eq!(x.get(0).unwrap(), AnyValue::String("1"));
        assert_eq!(x.get(2).unwrap(), AnyValue::Null);
    }

    #[test]
    fn blank_and_repeated_headers_are_named() {
        let range = sheet(vec![
            vec![s("a"), Data::Empty, s("a")],
            vec![Data::Int(1), Data::Int(2), Data::Int(3)],
        ]);
        let df = range_to_frame(&range).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["a", "column_2", "a.1"]);
    }

    #[test]
    fn timestamps_keep_time_of_day() {
        let range = sheet(vec![vec![s("t")], vec![s("2021-01-01 08:30:00")]]);
        let df = range_to_frame(&range).unwrap();
        assert!(matches!(
            df.column("t").unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
    }

    #[test]
    fn csv_bytes_load_with_header() {
        let bytes = b"Region,Sales\nN,10\nS,20\n".to_vec();
        let df = load(&TableSource::upload("sales.csv", bytes), &LoadOptions::default()).unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("Sales").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load(
            &TableSource::upload("data.parquet", Vec::new()),
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "parquet"));
    }

    #[test]
    fn corrupt_workbook_is_an_excel_error() {
        let err = load(
            &TableSource::upload("broken.xlsx", b"not a zip".to_vec()),
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Excel(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load(
            &TableSource::path("/definitely/not/here.xlsx"),
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn source_names() {
        assert_eq!(TableSource::path("/tmp/a/data.xlsx").name(), "data.xlsx");
        assert_eq!(TableSource::upload("up.csv", Vec::new()).name(), "up.csv");
    }
}
