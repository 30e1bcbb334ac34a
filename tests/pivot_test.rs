use color_eyre::Result;
use polars::prelude::*;
use sheetlens::pivot::{pivot, pivot_section, PivotOutcome, PivotRequest, PIVOT_PROMPT};

mod common;

#[test]
fn test_pivot_sums_per_row_group() -> Result<()> {
    let df = df!(
        "Region" => ["N", "S", "N"],
        "Sales" => [10i64, 5, 30]
    )?;
    let table = pivot(&df, &PivotRequest::new(["Region"], ["Sales"]))?.expect("pivot is ready");

    assert_eq!(common::texts(&table, "Region"), vec![Some("N".into()), Some("S".into())]);
    assert_eq!(common::texts(&table, "Sales"), vec![Some("40".into()), Some("5".into())]);
    Ok(())
}

#[test]
fn test_pivot_column_groups_fill_missing_with_zero() -> Result<()> {
    let df = common::sales_frame();
    let request = PivotRequest::new(["Region"], ["Units"]).with_columns(["Product"]);
    let table = pivot(&df, &request)?.expect("pivot is ready");

    assert_eq!(
        common::texts(&table, "Region"),
        vec![Some("East".into()), Some("North".into()), Some("South".into())]
    );
    assert_eq!(
        common::texts(&table, "Units_Coffee"),
        vec![Some("7".into()), Some("2".into()), Some("0".into())]
    );
    assert_eq!(
        common::texts(&table, "Units_Tea"),
        vec![Some("0".into()), Some("7".into()), Some("6".into())]
    );
    assert_eq!(table.column("Units_Tea")?.null_count(), 0);
    Ok(())
}

#[test]
fn test_pivot_without_rows_or_values_prompts() {
    let df = common::sales_frame();
    let outcome = pivot_section(&df, &PivotRequest::new(["Region"], Vec::<String>::new()));
    assert!(matches!(outcome, PivotOutcome::Prompt(ref msg) if msg == PIVOT_PROMPT));

    let outcome = pivot_section(&df, &PivotRequest::default());
    assert!(matches!(outcome, PivotOutcome::Prompt(_)));
}

#[test]
fn test_pivot_failures_are_reported_not_raised() {
    let df = common::sales_frame();

    let outcome = pivot_section(&df, &PivotRequest::new(["Region"], ["Product"]));
    assert!(matches!(outcome, PivotOutcome::Error(_)));

    let outcome = pivot_section(&df, &PivotRequest::new(["Zone"], ["Units"]));
    assert!(matches!(outcome, PivotOutcome::Error(ref msg) if msg.contains("Zone")));
}
