//! Spreadsheet exploration dashboard.
//!
//! A table is loaded once from a CSV or workbook ([`source`], memoized by
//! [`cache`]); every refresh then recomputes the filtered rows, summary
//! statistics, chart data, map points, and pivot table from the base table
//! and the user's [`dashboard::Selections`].

pub mod cache;
pub mod cells;
pub mod chart_data;
pub mod chart_export;
pub mod classify;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod error_display;
pub mod export;
pub mod filter;
pub mod logging;
pub mod map;
pub mod pivot;
pub mod report;
pub mod source;
pub mod statistics;

pub use cache::{CacheStats, TableCache};
pub use chart_data::{ChartData, ChartRequest};
pub use classify::ColumnRole;
pub use config::{AppConfig, ConfigManager};
pub use dashboard::{Dashboard, DashboardView, Selections};
pub use error::{ChartError, FilterError, LoadError, PivotError};
pub use filter::{DateRange, FilterSpec};
pub use pivot::{PivotOutcome, PivotRequest};
pub use sheetlens_cli::{Args, ChartKindArg, FileFormat, ThemeMode};
pub use source::{LoadOptions, TableSource};
pub use statistics::Summary;

/// Application name used for the config directory and log filtering
pub const APP_NAME: &str = "sheetlens";
