//! CSV export of the filtered table.

use polars::prelude::*;
use std::path::Path;

/// Media type offered with the export download.
pub const EXPORT_MIME: &str = "text/csv";

/// Serialize a table as UTF-8 CSV: comma separated, one header row, no index column.
pub fn to_delimited(df: &DataFrame) -> PolarsResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut df = df.clone();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut df)?;
    tracing::debug!(rows = df.height(), bytes = buf.len(), "export serialized");
    Ok(buf)
}

/// `filtered_<stem>.csv` for a source named `<stem>.<ext>`.
pub fn export_file_name(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "data".to_string());
    format!("filtered_{}.csv", stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows_in_order() {
        let df = df!("Region" => ["N", "S"], "Sales" => [10i64, 20]).unwrap();
        let bytes = to_delimited(&df).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "Region,Sales\nN,10\nS,20\n");
    }

    #[test]
    fn empty_table_still_has_header() {
        let df = df!("a" => Vec::<i64>::new()).unwrap();
        assert_eq!(to_delimited(&df).unwrap(), b"a\n".to_vec());
    }

    #[test]
    fn output_is_deterministic() {
        let df = df!("x" => [1.5f64, 2.25], "y" => ["a,b", "c"]).unwrap();
        assert_eq!(to_delimited(&df).unwrap(), to_delimited(&df).unwrap());
    }

    #[test]
    fn file_name_uses_stem() {
        assert_eq!(export_file_name("sales.xlsx"), "filtered_sales.csv");
        assert_eq!(export_file_name("/tmp/q1.report.csv"), "filtered_q1.report.csv");
        assert_eq!(export_file_name(""), "filtered_data.csv");
    }
}
