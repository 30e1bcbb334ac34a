use chrono::NaiveDate;
use color_eyre::Result;
use polars::prelude::*;
use sheetlens::error::FilterError;
use sheetlens::filter::{
    apply, coerce_date_column, date_bounds, unique_values, DateRange, FilterSpec,
};

mod common;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_empty_spec_keeps_every_row() -> Result<()> {
    let df = common::sales_frame();
    let out = apply(&df, &FilterSpec::new())?;
    assert!(out.equals_missing(&df));
    Ok(())
}

#[test]
fn test_selecting_every_present_value_drops_nothing() -> Result<()> {
    let df = common::sales_frame();
    let all = unique_values(&df, "Region")?;
    assert_eq!(all, vec!["North", "South", "East"]);

    let out = apply(&df, &FilterSpec::new().with_values("Region", all))?;
    assert_eq!(out.height(), df.height());
    Ok(())
}

#[test]
fn test_filter_result_is_subset_in_original_order() -> Result<()> {
    let df = common::sales_frame();
    let spec = FilterSpec::new()
        .with_values("Region", ["North", "South"])
        .with_values("Product", ["Tea"]);
    let out = apply(&df, &spec)?;

    assert_eq!(
        common::texts(&out, "Units"),
        vec![Some("3".into()), Some("5".into()), Some("1".into()), Some("4".into())]
    );
    assert_eq!(out.get_column_names(), df.get_column_names());
    Ok(())
}

#[test]
fn test_date_range_is_inclusive() -> Result<()> {
    let mut df = df!(
        "When" => ["2021-01-01", "2021-06-15", "2022-01-01"],
        "Sales" => [1i64, 2, 3]
    )?;
    coerce_date_column(&mut df, "When")?;

    let range = DateRange::new("When")
        .with_start(ymd(2021, 1, 1))
        .with_end(ymd(2021, 12, 31));
    let out = apply(&df, &FilterSpec::new().with_date_range(range))?;
    assert_eq!(common::texts(&out, "Sales"), vec![Some("1".into()), Some("2".into())]);
    Ok(())
}

#[test]
fn test_unparseable_dates_are_dropped_by_range() -> Result<()> {
    let mut df = df!(
        "When" => ["2021-03-01", "not a date", "2021-04-01"],
        "Sales" => [1i64, 2, 3]
    )?;
    coerce_date_column(&mut df, "When")?;
    assert_eq!(df.column("When")?.null_count(), 1);
    assert_eq!(date_bounds(&df, "When")?, Some((ymd(2021, 3, 1), ymd(2021, 4, 1))));

    let range = DateRange::new("When")
        .with_start(ymd(2021, 1, 1))
        .with_end(ymd(2021, 12, 31));
    let out = apply(&df, &FilterSpec::new().with_date_range(range))?;
    assert_eq!(out.height(), 2);
    Ok(())
}

#[test]
fn test_search_runs_after_column_filters() -> Result<()> {
    let df = common::sales_frame();
    let spec = FilterSpec::new()
        .with_values("Region", ["South"])
        .with_search("TEA");
    let out = apply(&df, &spec)?;
    assert_eq!(out.height(), 2);
    assert!(common::texts(&out, "Region")
        .iter()
        .all(|r| r.as_deref() == Some("South")));
    Ok(())
}

#[test]
fn test_search_matches_across_cell_boundaries() -> Result<()> {
    let df = common::sales_frame();
    // "Coffee 7" spans the Product and Units cells of the East row
    let out = apply(&df, &FilterSpec::new().with_search("coffee 7"))?;
    assert_eq!(common::texts(&out, "Region"), vec![Some("East".into())]);
    Ok(())
}

#[test]
fn test_search_without_match_yields_empty_table() -> Result<()> {
    let df = common::sales_frame();
    let out = apply(&df, &FilterSpec::new().with_search("zzz"))?;
    assert_eq!(out.height(), 0);
    assert_eq!(out.width(), df.width());
    Ok(())
}

#[test]
fn test_unknown_and_ineligible_columns_are_rejected() {
    let df = common::sales_frame();

    let err = apply(&df, &FilterSpec::new().with_values("Zone", ["North"])).unwrap_err();
    assert!(matches!(err, FilterError::UnknownColumn(c) if c == "Zone"));

    let range = DateRange::new("Units")
        .with_start(ymd(2023, 1, 1))
        .with_end(ymd(2023, 12, 31));
    let err = apply(&df, &FilterSpec::new().with_date_range(range)).unwrap_err();
    assert!(matches!(err, FilterError::NotDateEligible(_)));
}

#[test]
fn test_float_cells_match_every_significant_digit() -> Result<()> {
    let df = df!(
        "Site" => ["a", "b"],
        "x" => [3.14159265f64, 123456789.123]
    )?;

    let out = apply(&df, &FilterSpec::new().with_search("3.14159265"))?;
    assert_eq!(common::texts(&out, "Site"), vec![Some("a".into())]);

    assert_eq!(unique_values(&df, "x")?, vec!["3.14159265", "123456789.123"]);
    let out = apply(&df, &FilterSpec::new().with_values("x", ["123456789.123"]))?;
    assert_eq!(common::texts(&out, "Site"), vec![Some("b".into())]);
    Ok(())
}
