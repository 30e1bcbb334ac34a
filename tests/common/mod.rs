#![allow(dead_code)]

use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Small sales table used across the integration tests.
pub fn sales_frame() -> DataFrame {
    df!(
        "Region" => ["North", "South", "North", "East", "South", "North"],
        "Product" => ["Tea", "Tea", "Coffee", "Coffee", "Tea", "Tea"],
        "Units" => [3i64, 5, 2, 7, 1, 4],
        "Price" => [2.5, 2.5, 4.0, 4.0, 2.5, 2.5],
        "Date" => ["2023-01-15", "2023-02-03", "2023-02-20", "2023-03-11", "2023-04-01", "2023-05-30"]
    )
    .unwrap()
}

/// Write `df` as a CSV file named `name` inside `dir`.
pub fn write_csv(dir: &Path, name: &str, df: &mut DataFrame) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .unwrap();
    path
}

/// Rendered text of every cell in `column`, nulls as `None`.
pub fn texts(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    sheetlens::cells::column_texts(df.column(column).unwrap().as_materialized_series()).unwrap()
}
