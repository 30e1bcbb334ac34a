use chrono::NaiveDate;
use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use polars::prelude::DataFrame;
use std::path::PathBuf;
use sheetlens::chart_export::{write_chart, write_map};
use sheetlens::classify::{classify, date_candidates};
use sheetlens::error_display::user_message;
use sheetlens::filter::{coerce_date_column, date_bounds};
use sheetlens::report::{render_columns, render_view};
use sheetlens::{
    logging, AppConfig, Args, ChartKindArg, ChartRequest, ConfigManager, Dashboard, DateRange,
    FilterSpec, LoadOptions, PivotRequest, Selections, TableCache, TableSource, APP_NAME,
};

/// Split a `COL=VALUE` filter argument. The value may be empty.
fn parse_filter(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((column, _)) if column.is_empty() => {
            Err(eyre!("invalid --filter {:?}: missing column name", arg))
        }
        Some(pair) => Ok(pair),
        None => Err(eyre!("invalid --filter {:?}: expected COL=VALUE", arg)),
    }
}

fn parse_date(text: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .wrap_err_with(|| format!("invalid {} date {:?}: expected YYYY-MM-DD", flag, text))
}

/// Build the filter selections. A missing `--from` or `--to` defaults to the
/// date column's bounds, read from a coerced copy so `base` keeps its text.
fn filter_spec(args: &Args, base: &DataFrame) -> Result<FilterSpec> {
    let mut spec = FilterSpec::new();
    for arg in &args.filters {
        let (column, value) = parse_filter(arg)?;
        spec = if value.is_empty() {
            spec.with_values(column, Vec::<String>::new())
        } else {
            spec.with_values(column, [value])
        };
    }

    if let Some(column) = &args.date_column {
        let mut dates = base.clone();
        coerce_date_column(&mut dates, column)
            .wrap_err_with(|| format!("could not use {} as the date column", column))?;
        let bounds = date_bounds(&dates, column)?;
        let start = match &args.date_from {
            Some(text) => Some(parse_date(text, "--from")?),
            None => bounds.map(|(lo, _)| lo),
        };
        let end = match &args.date_to {
            Some(text) => Some(parse_date(text, "--to")?),
            None => bounds.map(|(_, hi)| hi),
        };
        let mut range = DateRange::new(column.as_str());
        if let Some(start) = start {
            range = range.with_start(start);
        }
        if let Some(end) = end {
            range = range.with_end(end);
        }
        spec = spec.with_date_range(range);
    }

    if let Some(term) = &args.search {
        spec = spec.with_search(term.as_str());
    }
    Ok(spec)
}

fn chart_request(args: &Args) -> Option<ChartRequest> {
    let (kind, x, y) = match (args.chart, &args.chart_x, &args.chart_y) {
        (Some(kind), Some(x), Some(y)) => (kind, x.clone(), y.clone()),
        _ => return None,
    };
    Some(match kind {
        ChartKindArg::Pie => ChartRequest::Pie { category: x, value: y },
        ChartKindArg::Bar => ChartRequest::Bar { x, y },
        ChartKindArg::Line => ChartRequest::Line { x, y },
    })
}

fn selections(args: &Args, config: &AppConfig, base: &DataFrame) -> Result<Selections> {
    let theme = match args.theme {
        Some(theme) => theme,
        None => config.theme.theme_mode()?,
    };
    Ok(Selections {
        filters: filter_spec(args, base)?,
        chart: chart_request(args),
        pivot: PivotRequest::new(args.pivot_rows.clone(), args.pivot_values.clone())
            .with_columns(args.pivot_columns.clone()),
        theme,
    })
}

fn run(args: &Args) -> Result<()> {
    let config = AppConfig::load(APP_NAME)?;
    logging::init(&config.logging.level, args.debug)?;

    let source = TableSource::path(
        args.path
            .clone()
            .unwrap_or_else(|| config.file_loading.default_path.clone()),
    );
    let options = LoadOptions {
        excel_sheet: args
            .excel_sheet
            .clone()
            .or_else(|| config.file_loading.excel_sheet.clone()),
        parse_dates: config.file_loading.parse_dates,
    };

    let mut cache = TableCache::new(config.cache.capacity);
    let mut base = cache.load(&source, &options)?;

    if args.list_columns {
        print!(
            "{}",
            render_columns(&base, &classify(&base), &date_candidates(&base))?
        );
        return Ok(());
    }

    let selections = selections(args, &config, &base)?;
    let view = Dashboard::new(source.name()).refresh(&mut base, &selections)?;
    let max_rows = args.max_rows.unwrap_or(config.display.max_rows);
    print!("{}", render_view(&view, max_rows)?);

    let export_targets = args
        .export
        .then(|| PathBuf::from(&view.export_name))
        .into_iter()
        .chain(args.export_to.clone());
    for path in export_targets {
        std::fs::write(&path, &view.export_bytes)
            .wrap_err_with(|| format!("could not write {}", path.display()))?;
        println!("Exported {} rows to {}", view.filtered.height(), path.display());
    }

    if let Some(path) = &args.chart_out {
        match &view.chart {
            Some(Ok(data)) => {
                write_chart(path, data, view.theme, config.chart.size())?;
                println!("Chart written to {}", path.display());
            }
            Some(Err(message)) => return Err(eyre!("cannot draw chart: {}", message)),
            None => {}
        }
    }

    if let Some(path) = &args.map_out {
        let map = view
            .map
            .as_ref()
            .map_err(|message| eyre!("cannot draw map: {}", message))?;
        let points = map.coordinates()?;
        if points.is_empty() {
            eprintln!("No map points to draw.");
        } else {
            write_map(path, &points, view.theme, config.chart.size())?;
            println!("Map written to {}", path.display());
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let manager = ConfigManager::new(APP_NAME)?;
        let path = manager.write_default_config(args.force)?;
        println!("Configuration written to {}", path.display());
        return Ok(Some(()));
    }
    Ok(None)
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let result = match handle_early_exit_flags(&args) {
        Ok(Some(())) => return Ok(()),
        Ok(None) => run(&args),
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", user_message(&e));
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use sheetlens::ThemeMode;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("sheetlens").chain(extra.iter().copied()))
    }

    fn base() -> DataFrame {
        df!(
            "Region" => ["N", "S", "N"],
            "When" => ["2021-01-05", "2021-03-01", "2021-07-30"]
        )
        .unwrap()
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter("Region=N").unwrap(), ("Region", "N"));
        assert_eq!(parse_filter("Note=a=b").unwrap(), ("Note", "a=b"));
        assert_eq!(parse_filter("Region=").unwrap(), ("Region", ""));
        assert!(parse_filter("Region").is_err());
        assert!(parse_filter("=N").is_err());
    }

    #[test]
    fn test_filters_collect_per_column() {
        let df = base();
        let spec = filter_spec(
            &args(&["--filter", "Region=N", "--filter", "Region=S", "--filter", "When="]),
            &df,
        )
        .unwrap();
        assert_eq!(spec.columns["Region"].len(), 2);
        assert!(spec.columns["When"].is_empty());
    }

    #[test]
    fn test_missing_date_endpoint_defaults_to_bounds() {
        let df = base();
        let spec = filter_spec(&args(&["--date-column", "When", "--from", "2021-02-01"]), &df)
            .unwrap();
        let range = spec.date_range.unwrap();
        assert_eq!(
            range.bounds(),
            Some((
                NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 7, 30).unwrap()
            ))
        );
        assert_eq!(df.column("When").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_date_column_value_filter_uses_file_text() {
        let mut df = df!(
            "When" => ["01/05/2021", "03/01/2021"],
            "Units" => [3i64, 5]
        )
        .unwrap();
        let args = args(&[
            "--filter",
            "When=01/05/2021",
            "--date-column",
            "When",
            "--from",
            "2020-01-01",
            "--to",
            "2030-12-31",
        ]);
        let selections = selections(&args, &AppConfig::default(), &df).unwrap();
        let view = Dashboard::new("x.csv").refresh(&mut df, &selections).unwrap();
        assert_eq!(view.filtered.height(), 1);
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let df = base();
        assert!(filter_spec(&args(&["--date-column", "When", "--to", "30/07/2021"]), &df).is_err());
    }

    #[test]
    fn test_chart_request_from_args() {
        let request = chart_request(&args(&["--chart", "pie", "--x", "Region", "--y", "Sales"]));
        assert_eq!(
            request,
            Some(ChartRequest::Pie {
                category: "Region".into(),
                value: "Sales".into()
            })
        );
        assert_eq!(chart_request(&args(&[])), None);
    }

    #[test]
    fn test_theme_flag_overrides_config() {
        let df = base();
        let mut config = AppConfig::default();
        config.theme.mode = "dark".to_string();
        let from_config = selections(&args(&[]), &config, &df).unwrap();
        assert_eq!(from_config.theme, ThemeMode::Dark);
        let from_flag = selections(&args(&["--theme", "light"]), &config, &df).unwrap();
        assert_eq!(from_flag.theme, ThemeMode::Light);
    }
}
