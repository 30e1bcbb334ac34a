//! Draw charts and map points to PNG (plotters bitmap) or SVG.

use crate::chart_data::{format_x_label, ChartData};
use color_eyre::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use sheetlens_cli::ThemeMode;
use std::f64::consts::PI;
use std::path::Path;

/// Image format, chosen from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }
}

/// Colors for one theme mode.
#[derive(Debug, Clone, Copy)]
pub struct ChartTheme {
    pub background: RGBColor,
    pub foreground: RGBColor,
    pub grid: RGBColor,
    pub palette: &'static [RGBColor],
}

const LIGHT_PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(23, 190, 207),
];

const DARK_PALETTE: [RGBColor; 8] = [
    RGBColor(99, 178, 255),
    RGBColor(255, 170, 80),
    RGBColor(110, 220, 110),
    RGBColor(255, 105, 105),
    RGBColor(200, 160, 255),
    RGBColor(220, 170, 140),
    RGBColor(255, 160, 220),
    RGBColor(90, 230, 240),
];

impl ChartTheme {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self {
                background: WHITE,
                foreground: BLACK,
                grid: RGBColor(220, 220, 220),
                palette: &LIGHT_PALETTE,
            },
            ThemeMode::Dark => Self {
                background: RGBColor(14, 17, 23),
                foreground: RGBColor(250, 250, 250),
                grid: RGBColor(60, 64, 72),
                palette: &DARK_PALETTE,
            },
        }
    }

    pub fn color(&self, idx: usize) -> RGBColor {
        self.palette[idx % self.palette.len()]
    }
}

fn format_of(path: &Path) -> Result<ImageFormat> {
    ImageFormat::from_path(path).ok_or_else(|| {
        color_eyre::eyre::eyre!(
            "Unsupported image type for {} (expected .png or .svg)",
            path.display()
        )
    })
}

/// Write a chart to `path`; the extension picks PNG or SVG.
pub fn write_chart(path: &Path, data: &ChartData, mode: ThemeMode, size: (u32, u32)) -> Result<()> {
    if data.is_empty() {
        return Err(color_eyre::eyre::eyre!("No data to export"));
    }
    let theme = ChartTheme::for_mode(mode);
    match format_of(path)? {
        ImageFormat::Png => draw_chart(BitMapBackend::new(path, size).into_drawing_area(), data, &theme)?,
        ImageFormat::Svg => draw_chart(SVGBackend::new(path, size).into_drawing_area(), data, &theme)?,
    }
    tracing::info!(path = %path.display(), "chart written");
    Ok(())
}

/// Write (longitude, latitude) points as a scatter plot.
pub fn write_map(path: &Path, points: &[(f64, f64)], mode: ThemeMode, size: (u32, u32)) -> Result<()> {
    if points.is_empty() {
        return Err(color_eyre::eyre::eyre!("No map points to export"));
    }
    let theme = ChartTheme::for_mode(mode);
    match format_of(path)? {
        ImageFormat::Png => draw_map(BitMapBackend::new(path, size).into_drawing_area(), points, &theme)?,
        ImageFormat::Svg => draw_map(SVGBackend::new(path, size).into_drawing_area(), points, &theme)?,
    }
    tracing::info!(path = %path.display(), points = points.len(), "map written");
    Ok(())
}

/// Pad a degenerate or inverted range so plotters always gets a non-empty span.
fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if max > min {
        let pad = (max - min) * 0.05;
        (min - pad, max + pad)
    } else {
        (min - 1.0, max + 1.0)
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Polygon outline of one pie wedge between two angles (radians, clockwise from 12 o'clock).
pub fn wedge_points(center: (i32, i32), radius: f64, start: f64, end: f64) -> Vec<(i32, i32)> {
    let steps = (((end - start) / (2.0 * PI)) * 90.0).ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for i in 0..=steps {
        let angle = start + (end - start) * i as f64 / steps as f64;
        points.push((
            center.0 + (radius * angle.sin()).round() as i32,
            center.1 - (radius * angle.cos()).round() as i32,
        ));
    }
    points
}

fn draw_chart<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    data: &ChartData,
    theme: &ChartTheme,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&theme.background)?;
    let title_font = ("sans-serif", 22).into_font().color(&theme.foreground);
    let label_font = ("sans-serif", 14).into_font().color(&theme.foreground);

    match data {
        ChartData::Pie { title, slices } => {
            let area = root.titled(title, title_font)?;
            let (w, h) = area.dim_in_pixel();
            let center = ((w / 2) as i32, (h / 2) as i32);
            let radius = (w.min(h) as f64) * 0.35;
            let total: f64 = slices.iter().map(|(_, v)| v.max(0.0)).sum();
            if total > 0.0 {
                let mut start = 0.0;
                for (idx, (label, value)) in slices.iter().enumerate() {
                    let share = value.max(0.0) / total;
                    if share <= 0.0 {
                        continue;
                    }
                    let end = start + share * 2.0 * PI;
                    let color = theme.color(idx);
                    area.draw(&Polygon::new(
                        wedge_points(center, radius, start, end),
                        color.filled(),
                    ))?;
                    let mid = (start + end) / 2.0;
                    let pos = (
                        center.0 + (radius * 1.15 * mid.sin()) as i32,
                        center.1 - (radius * 1.15 * mid.cos()) as i32,
                    );
                    let text = format!("{} ({:.1}%)", label, share * 100.0);
                    area.draw(&Text::new(text, pos, label_font.clone()))?;
                    start = end;
                }
            }
        }
        ChartData::Bar {
            title,
            x_label,
            y_label,
            bars,
        } => {
            let (lo, hi) = bounds(bars.iter().map(|(_, v)| *v));
            let (y_min, y_max) = padded_range(lo.min(0.0), hi.max(0.0));
            let n = bars.len() as f64;
            let mut chart = ChartBuilder::on(&root)
                .caption(title, title_font)
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(-0.5..(n - 0.5), y_min..y_max)?;
            let label_of = |x: &f64| {
                let idx = x.round();
                if idx >= 0.0 && (x - idx).abs() < 1e-9 {
                    bars.get(idx as usize).map(|(l, _)| l.clone()).unwrap_or_default()
                } else {
                    String::new()
                }
            };
            chart
                .configure_mesh()
                .disable_x_mesh()
                .light_line_style(theme.grid)
                .axis_style(theme.foreground)
                .label_style(label_font.clone())
                .x_labels(bars.len().max(1))
                .x_label_formatter(&label_of)
                .x_desc(x_label.as_str())
                .y_desc(y_label.as_str())
                .draw()?;
            chart.draw_series(bars.iter().enumerate().map(|(idx, (_, v))| {
                let x = idx as f64;
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *v)], theme.color(idx).filled())
            }))?;
        }
        ChartData::Line {
            title,
            x_label,
            y_label,
            points,
            x_kind,
            categories,
        } => {
            let (x_lo, x_hi) = bounds(points.iter().map(|p| p.0));
            let (y_lo, y_hi) = bounds(points.iter().map(|p| p.1));
            let (x_min, x_max) = padded_range(x_lo, x_hi);
            let (y_min, y_max) = padded_range(y_lo, y_hi);
            let mut chart = ChartBuilder::on(&root)
                .caption(title, title_font)
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
            let label_of = |x: &f64| format_x_label(*x_kind, *x, categories);
            chart
                .configure_mesh()
                .light_line_style(theme.grid)
                .axis_style(theme.foreground)
                .label_style(label_font.clone())
                .x_label_formatter(&label_of)
                .x_desc(x_label.as_str())
                .y_desc(y_label.as_str())
                .draw()?;
            let color = theme.color(0);
            chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?;
        }
    }

    root.present()?;
    Ok(())
}

fn draw_map<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    points: &[(f64, f64)],
    theme: &ChartTheme,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&theme.background)?;
    let (x_lo, x_hi) = bounds(points.iter().map(|p| p.0));
    let (y_lo, y_hi) = bounds(points.iter().map(|p| p.1));
    let (x_min, x_max) = padded_range(x_lo, x_hi);
    let (y_min, y_max) = padded_range(y_lo, y_hi);

    let mut chart = ChartBuilder::on(&root)
        .caption("Map View", ("sans-serif", 22).into_font().color(&theme.foreground))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    chart
        .configure_mesh()
        .light_line_style(theme.grid)
        .axis_style(theme.foreground)
        .label_style(("sans-serif", 14).into_font().color(&theme.foreground))
        .x_desc("Longitude")
        .y_desc("Latitude")
        .draw()?;
    let color = theme.color(3);
    chart.draw_series(
        points
            .iter()
            .map(|&p| Circle::new(p, 4, color.filled())),
    )?;
    root.present()?;
    Ok(())
}
