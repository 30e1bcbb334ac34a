//! Shared CLI definitions for sheetlens.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Input file format, detected from the file extension.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-separated values
    Csv,
    /// Excel or OpenDocument workbook (.xls, .xlsx, .xlsm, .xlsb, .ods)
    Excel,
}

impl FileFormat {
    /// Detect file format from path extension. Returns None when extension is missing or unknown.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse format from extension string (e.g. "xlsx", "csv").
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Chart kinds offered by the dashboard
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ChartKindArg {
    /// Pie chart: --x is the category, --y the value
    Pie,
    /// Bar chart: --x is the category, --y the value, bars colored by category
    Bar,
    /// Line chart: --x may be any column, --y must be numeric
    Line,
}

/// Color theme for rendered charts and maps
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ThemeMode {
    Light,
    Dark,
}

/// Command-line arguments for sheetlens
#[derive(Clone, Parser, Debug)]
#[command(
    name = "sheetlens",
    version,
    about = "Spreadsheet exploration dashboard for the terminal",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Spreadsheet (xlsx, xls, xlsm, xlsb, ods) or CSV file to open.
    /// When omitted, [file_loading] default_path from the config is used.
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Excel sheet to load: 0-based index (e.g. 0) or sheet name (e.g. "Sales")
    #[arg(long = "sheet", value_name = "SHEET")]
    pub excel_sheet: Option<String>,

    /// Keep only rows whose COL value is VALUE. Repeat to allow more values or filter more columns.
    /// "COL=" with no value selects nothing for that column.
    #[arg(long = "filter", value_name = "COL=VALUE")]
    pub filters: Vec<String>,

    /// Column to filter by date range (coerced to dates; unparseable values are dropped)
    #[arg(long = "date-column", value_name = "COL")]
    pub date_column: Option<String>,

    /// Start of the date range, inclusive (YYYY-MM-DD). Defaults to the earliest date.
    #[arg(long = "from", value_name = "DATE", requires = "date_column")]
    pub date_from: Option<String>,

    /// End of the date range, inclusive (YYYY-MM-DD). Defaults to the latest date.
    #[arg(long = "to", value_name = "DATE", requires = "date_column")]
    pub date_to: Option<String>,

    /// Keep only rows containing this text in any column (case-insensitive)
    #[arg(long = "search", value_name = "TEXT")]
    pub search: Option<String>,

    /// Chart to build from the filtered rows
    #[arg(long = "chart", value_enum, requires_all = ["chart_x", "chart_y"])]
    pub chart: Option<ChartKindArg>,

    /// Chart category (pie, bar) or x-axis (line) column
    #[arg(long = "x", value_name = "COL")]
    pub chart_x: Option<String>,

    /// Chart value (pie) or y-axis (bar, line) column; must be numeric
    #[arg(long = "y", value_name = "COL")]
    pub chart_y: Option<String>,

    /// Draw the chart to this file (.png or .svg)
    #[arg(long = "chart-out", value_name = "FILE", requires = "chart")]
    pub chart_out: Option<PathBuf>,

    /// Draw the Latitude/Longitude points to this file (.png or .svg)
    #[arg(long = "map-out", value_name = "FILE")]
    pub map_out: Option<PathBuf>,

    /// Pivot row-grouping column (repeatable)
    #[arg(long = "pivot-rows", value_name = "COL")]
    pub pivot_rows: Vec<String>,

    /// Pivot column-grouping column (repeatable)
    #[arg(long = "pivot-columns", value_name = "COL")]
    pub pivot_columns: Vec<String>,

    /// Pivot value column to sum (repeatable; must be numeric)
    #[arg(long = "pivot-values", value_name = "COL")]
    pub pivot_values: Vec<String>,

    /// Write the filtered rows as CSV to filtered_<basename>.csv in the current directory
    #[arg(long = "export", action)]
    pub export: bool,

    /// Write the filtered rows as CSV to this file instead
    #[arg(long = "export-to", value_name = "FILE")]
    pub export_to: Option<PathBuf>,

    /// Chart and map color theme (overrides config [theme] mode)
    #[arg(long = "theme", value_enum)]
    pub theme: Option<ThemeMode>,

    /// Print column roles, date column candidates, and filter values, then exit
    #[arg(long = "columns", action)]
    pub list_columns: bool,

    /// Maximum number of rows printed for the filtered table (overrides config [display] max_rows)
    #[arg(long = "max-rows", value_name = "N")]
    pub max_rows: Option<usize>,

    /// Generate default configuration file at ~/.config/sheetlens/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,

    /// Enable debug logging on stderr
    #[arg(long = "debug", action)]
    pub debug: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
///
/// Used by the gen_docs binary; output is written to stdout.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let placeholder: String = arg
            .get_value_names()
            .map(|names| {
                names
                    .iter()
                    .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        let option_str = if arg.is_positional() {
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            if !arg.get_action().takes_values() || placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_format_from_path() {
        assert_eq!(
            FileFormat::from_path(Path::new("data.xlsx")),
            Some(FileFormat::Excel)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("data.CSV")),
            Some(FileFormat::Csv)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("sheet.ods")),
            Some(FileFormat::Excel)
        );
        assert_eq!(FileFormat::from_path(Path::new("noext")), None);
        assert_eq!(FileFormat::from_path(Path::new("data.parquet")), None);
    }

    #[test]
    fn test_args_parse_filters_and_pivot() {
        let args = Args::try_parse_from([
            "sheetlens",
            "sales.xlsx",
            "--filter",
            "Region=N",
            "--filter",
            "Region=S",
            "--pivot-rows",
            "Region",
            "--pivot-values",
            "Sales",
        ])
        .unwrap();
        assert_eq!(args.path, Some(PathBuf::from("sales.xlsx")));
        assert_eq!(args.filters, vec!["Region=N", "Region=S"]);
        assert_eq!(args.pivot_rows, vec!["Region"]);
        assert_eq!(args.pivot_values, vec!["Sales"]);
        assert!(!args.export);
        assert!(args.export_to.is_none());
    }

    #[test]
    fn test_export_flags() {
        let args = Args::try_parse_from(["sheetlens", "data.csv", "--export"]).unwrap();
        assert!(args.export);
        let args =
            Args::try_parse_from(["sheetlens", "data.csv", "--export-to", "out.csv"]).unwrap();
        assert_eq!(args.export_to, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn test_chart_requires_axes() {
        assert!(Args::try_parse_from(["sheetlens", "data.csv", "--chart", "bar"]).is_err());
        let args = Args::try_parse_from([
            "sheetlens", "data.csv", "--chart", "pie", "--x", "Region", "--y", "Sales",
        ])
        .unwrap();
        assert_eq!(args.chart, Some(ChartKindArg::Pie));
    }

    #[test]
    fn test_options_markdown_lists_flags() {
        let md = render_options_markdown();
        assert!(md.contains("--filter"));
        assert!(md.contains("--pivot-values"));
        assert!(!md.contains("`--help`"));
    }
}
