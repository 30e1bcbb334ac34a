//! One refresh of the dashboard: every section recomputed from the base table
//! and the current selections.

use crate::chart_data::{chart_data, ChartData, ChartRequest};
use crate::classify::{classify, date_candidates, ColumnRole};
use crate::export::{export_file_name, to_delimited};
use crate::filter::{apply_with_originals, coerce_date_column, date_bounds, FilterSpec};
use crate::map::{map_section, MapView};
use crate::pivot::{pivot_section, PivotOutcome, PivotRequest};
use crate::statistics::{summarize, Summary};
use chrono::NaiveDate;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use polars::prelude::*;
use sheetlens_cli::ThemeMode;

/// Everything the user has chosen for this refresh. Never persisted.
#[derive(Debug, Clone)]
pub struct Selections {
    pub filters: FilterSpec,
    pub chart: Option<ChartRequest>,
    pub pivot: PivotRequest,
    pub theme: ThemeMode,
}

impl Default for Selections {
    fn default() -> Self {
        Self {
            filters: FilterSpec::default(),
            chart: None,
            pivot: PivotRequest::default(),
            theme: ThemeMode::Light,
        }
    }
}

/// The computed sections, in display order.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub source_name: String,
    /// (rows, columns) of the base table.
    pub base_shape: (usize, usize),
    pub columns: Vec<(String, ColumnRole)>,
    pub date_candidates: Vec<String>,
    /// Range offered for the designated date column.
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    pub filtered: DataFrame,
    pub summary: Summary,
    pub export_bytes: Vec<u8>,
    pub export_name: String,
    /// `None` when no chart is selected; `Err` holds a message for the chart section.
    pub chart: Option<std::result::Result<ChartData, String>>,
    /// `Err` holds a message for the map section.
    pub map: std::result::Result<MapView, String>,
    pub pivot: PivotOutcome,
    pub theme: ThemeMode,
}

pub struct Dashboard {
    source_name: String,
}

impl Dashboard {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
        }
    }

    /// Recompute every section. Only selections that do not fit the table
    /// fail the refresh; chart, map, and pivot problems are reported in the view.
    pub fn refresh(&self, base: &mut DataFrame, selections: &Selections) -> Result<DashboardView> {
        let spec = &selections.filters;
        spec.validate(base).wrap_err("invalid filter selection")?;
        // value filters match the text shown before any date coercion
        let originals = base.select(spec.columns.keys().map(String::as_str))?;

        let mut bounds = None;
        if let Some(range) = &spec.date_range {
            coerce_date_column(base, &range.column)
                .wrap_err_with(|| format!("could not convert {} to dates", range.column))?;
            bounds = date_bounds(base, &range.column)?;
        }

        let columns = classify(base);
        let candidates = date_candidates(base);
        let filtered =
            apply_with_originals(base, &originals, spec).wrap_err("filtering failed")?;
        tracing::info!(
            base_rows = base.height(),
            rows = filtered.height(),
            filtered = !spec.is_empty(),
            "refresh filtered"
        );

        let summary = summarize(&filtered).wrap_err("summary statistics failed")?;
        let export_bytes = to_delimited(&filtered).wrap_err("CSV export failed")?;

        let chart = selections.chart.as_ref().map(|request| {
            chart_data(&filtered, request).map_err(|e| {
                tracing::warn!(error = %e, "chart unavailable");
                e.to_string()
            })
        });
        let map = map_section(&filtered);
        let pivot = pivot_section(&filtered, &selections.pivot);

        Ok(DashboardView {
            source_name: self.source_name.clone(),
            base_shape: (base.height(), base.width()),
            columns,
            date_candidates: candidates,
            date_bounds: bounds,
            filtered,
            summary,
            export_bytes,
            export_name: export_file_name(&self.source_name),
            chart,
            map,
            pivot,
            theme: selections.theme,
        })
    }
}
