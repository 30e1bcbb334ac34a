//! Plain-text rendering of a dashboard view for the terminal.

use crate::cells::column_texts;
use crate::chart_data::{format_x_label, ChartData};
use crate::classify::{category_columns, numeric_columns, ColumnRole};
use crate::dashboard::DashboardView;
use crate::error::FilterError;
use crate::export::EXPORT_MIME;
use crate::filter::unique_values;
use crate::map::MapView;
use crate::pivot::PivotOutcome;
use crate::statistics::format_number;
use polars::prelude::*;
use std::fmt::Write;

/// Widest a rendered cell may be before it is cut with an ellipsis.
const MAX_CELL_WIDTH: usize = 32;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

/// Render up to `max_rows` rows as an aligned text table. Numeric columns are
/// right-aligned; nulls print as empty cells.
pub fn render_table(df: &DataFrame, max_rows: usize) -> PolarsResult<String> {
    let shown = df.height().min(max_rows);
    let head = df.head(Some(shown));
    let mut columns: Vec<(String, bool, Vec<String>)> = Vec::with_capacity(df.width());
    for col in head.get_columns() {
        let series = col.as_materialized_series();
        let cells = column_texts(series)?
            .into_iter()
            .map(|c| truncate(c.as_deref().unwrap_or(""), MAX_CELL_WIDTH))
            .collect();
        columns.push((
            truncate(series.name(), MAX_CELL_WIDTH),
            series.dtype().is_numeric(),
            cells,
        ));
    }

    let widths: Vec<usize> = columns
        .iter()
        .map(|(name, _, cells)| {
            cells
                .iter()
                .map(|c| c.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let pad = |text: &str, width: usize, right: bool| {
        if right {
            format!("{:>width$}", text, width = width)
        } else {
            format!("{:<width$}", text, width = width)
        }
    };

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|((name, numeric, _), w)| pad(name.as_str(), *w, *numeric))
        .collect();
    let _ = writeln!(out, "{}", header.join(" | ").trim_end());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in 0..shown {
        let line: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|((_, numeric, cells), w)| pad(cells[row].as_str(), *w, *numeric))
            .collect();
        let _ = writeln!(out, "{}", line.join(" | ").trim_end());
    }
    if df.height() > shown {
        let _ = writeln!(out, "… {} more rows", df.height() - shown);
    }
    Ok(out)
}

/// Column roles, date-filter candidates, and the values each column filter offers.
pub fn render_columns(
    df: &DataFrame,
    roles: &[(String, ColumnRole)],
    date_candidates: &[String],
) -> Result<String, FilterError> {
    let mut out = String::new();
    let _ = writeln!(out, "Columns ({}):", roles.len());
    for (name, role) in roles {
        let options = unique_values(df, name)?;
        let preview: Vec<&str> = options.iter().take(8).map(String::as_str).collect();
        let more = if options.len() > preview.len() {
            format!(", … ({} values)", options.len())
        } else {
            String::new()
        };
        let _ = writeln!(out, "  {:<24} {:<12} {}{}", name, role, preview.join(", "), more);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Chart categories (--x): {}", category_columns(df).join(", "));
    let _ = writeln!(out, "Chart values (--y): {}", numeric_columns(df).join(", "));
    let _ = write!(out, "Date column choices: None");
    for name in date_candidates {
        let _ = write!(out, ", {}", name);
    }
    let _ = writeln!(out);
    Ok(out)
}

fn render_chart(out: &mut String, chart: &ChartData) {
    let _ = writeln!(out, "{}", chart.title());
    match chart {
        ChartData::Pie { slices, .. } => {
            let total: f64 = slices.iter().map(|(_, v)| v.max(0.0)).sum();
            for (label, value) in slices {
                let share = if total > 0.0 {
                    value.max(0.0) / total * 100.0
                } else {
                    0.0
                };
                let _ = writeln!(out, "  {}: {} ({:.1}%)", label, format_number(*value), share);
            }
        }
        ChartData::Bar { bars, .. } => {
            let peak = bars.iter().map(|(_, v)| v.abs()).fold(0.0, f64::max);
            for (label, value) in bars {
                let len = if peak > 0.0 {
                    (value.abs() / peak * 30.0).round() as usize
                } else {
                    0
                };
                let _ = writeln!(
                    out,
                    "  {:<16} {:<30} {}",
                    truncate(label, 16),
                    "#".repeat(len),
                    format_number(*value)
                );
            }
        }
        ChartData::Line {
            points,
            x_kind,
            categories,
            ..
        } => {
            let _ = writeln!(out, "  {} points", points.len());
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                let _ = writeln!(
                    out,
                    "  from ({}, {}) to ({}, {})",
                    format_x_label(*x_kind, first.0, categories),
                    format_number(first.1),
                    format_x_label(*x_kind, last.0, categories),
                    format_number(last.1)
                );
            }
        }
    }
}

/// The whole dashboard, section by section.
pub fn render_view(view: &DashboardView, max_rows: usize) -> PolarsResult<String> {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Data loaded: {} rows, {} columns ({})",
        view.base_shape.0, view.base_shape.1, view.source_name
    );

    let _ = writeln!(out, "\n## Filtered Data ({} rows)", view.filtered.height());
    out.push_str(&render_table(&view.filtered, max_rows)?);
    let _ = writeln!(
        out,
        "Download: {} ({} bytes, {})",
        view.export_name,
        view.export_bytes.len(),
        EXPORT_MIME
    );

    let _ = writeln!(out, "\n## Summary Statistics");
    let summary = view.summary.to_frame()?;
    out.push_str(&render_table(&summary, summary.height())?);

    let _ = writeln!(out, "\n## Chart");
    match &view.chart {
        None => {
            let _ = writeln!(out, "No chart selected (use --chart with --x and --y).");
        }
        Some(Ok(chart)) if chart.is_empty() => {
            let _ = writeln!(out, "{}\n  no data", chart.title());
        }
        Some(Ok(chart)) => render_chart(&mut out, chart),
        Some(Err(message)) => {
            let _ = writeln!(out, "Chart unavailable: {}", message);
        }
    }

    let _ = writeln!(out, "\n## Map View");
    match &view.map {
        Ok(MapView::Points(points)) => {
            let _ = writeln!(out, "{} points", points.height());
            out.push_str(&render_table(points, max_rows)?);
        }
        Ok(MapView::LocationHint(hint)) => {
            let _ = writeln!(out, "{}", hint);
        }
        Ok(MapView::Unavailable) => {
            let _ = writeln!(out, "No Latitude/Longitude columns.");
        }
        Err(message) => {
            let _ = writeln!(out, "Map unavailable: {}", message);
        }
    }

    let _ = writeln!(out, "\n## Pivot Table");
    match &view.pivot {
        PivotOutcome::Table(table) => out.push_str(&render_table(table, max_rows)?),
        PivotOutcome::Prompt(message) | PivotOutcome::Error(message) => {
            let _ = writeln!(out, "{}", message);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_aligned_and_truncated() {
        let df = df!(
            "Region" => [Some("N"), None, Some("South")],
            "Sales" => [10i64, 200, 3]
        )
        .unwrap();
        let text = render_table(&df, 2).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Region | Sales");
        assert_eq!(lines[1], "-------+------");
        assert_eq!(lines[2], "N      |    10");
        assert_eq!(lines[3], "       |   200");
        assert_eq!(lines[4], "… 1 more rows");
    }

    #[test]
    fn long_cells_are_cut() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }

    #[test]
    fn columns_listing_offers_none_for_dates() {
        let df = df!("Region" => ["N", "S"], "Sales" => [1i64, 2]).unwrap();
        let roles = crate::classify::classify(&df);
        let text = render_columns(&df, &roles, &["Region".to_string()]).unwrap();
        assert!(text.contains("Region"));
        assert!(text.contains("numeric"));
        assert!(text.contains("Chart categories (--x): Region"));
        assert!(text.contains("Chart values (--y): Sales"));
        assert!(text.contains("Date column choices: None, Region"));
    }
}
