//! Two-panel SVG sales chart: daily trend (left) and regional totals (right).
//!
//! All values come precomputed from `SalesSummary`; this module only draws.

use std::path::Path;

use chrono::{Days, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use crate::error::{AppError, ErrorKind};
use crate::report::{DailyTotal, RegionTotal, SalesSummary};

pub const CHART_FILE_NAME: &str = "sales_analysis_charts.svg";

/// Full canvas size in pixels (two 800x600 panels side by side).
pub const CHART_SIZE: (u32, u32) = (1600, 600);

const TREND_COLOR: RGBColor = RGBColor(46, 134, 171);
const BAR_COLOR: RGBColor = RGBColor(162, 59, 114);

/// Render the sales chart to `path`.
pub fn render_sales_chart(path: &Path, summary: &SalesSummary) -> Result<(), AppError> {
    if summary.daily_totals.is_empty() || summary.region_totals.is_empty() {
        return Err(AppError::new(ErrorKind::Output, "Cannot chart an empty dataset."));
    }

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    let (left, right) = root.split_horizontally(CHART_SIZE.0 / 2);

    draw_daily_trend(&left, &summary.daily_totals)?;
    draw_region_bars(&right, &summary.region_totals)?;

    root.present().map_err(|e| {
        AppError::new(
            ErrorKind::Output,
            format!("Failed to write chart '{}': {e}", path.display()),
        )
    })?;
    info!(path = %path.display(), "chart written");
    Ok(())
}

fn draw_daily_trend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    daily: &[DailyTotal],
) -> Result<(), AppError> {
    let Some(origin) = daily.first().map(|d| d.date) else {
        return Ok(());
    };
    let points = day_offsets(origin, daily);
    let x_max = points.last().map(|p| p.0).unwrap_or(0.0).max(1.0);
    let y_max = axis_max(points.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(area)
        .caption("Daily Sales Trend", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(90)
        .build_cartesian_2d(-0.5..x_max + 0.5, 0.0..y_max)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Sales")
        .x_labels(10)
        .x_label_formatter(&|v| date_tick(origin, *v))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), TREND_COLOR.stroke_width(2)))
        .map_err(draw_err)?;
    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 4, TREND_COLOR.filled())))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_region_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    totals: &[RegionTotal],
) -> Result<(), AppError> {
    let n = totals.len();
    let y_max = axis_max(totals.iter().map(|t| t.total));

    let mut chart = ChartBuilder::on(area)
        .caption("Sales by Region", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(90)
        .build_cartesian_2d((0..n).into_segmented(), 0.0..y_max)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Region")
        .y_desc("Sales")
        .x_labels(n)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => totals.get(*i).map(|t| t.region.clone()).unwrap_or_default(),
            _ => String::new(),
        })
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(totals.iter().enumerate().map(|(i, t)| {
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), t.total)],
                BAR_COLOR.filled(),
            );
            bar.set_margin(0, 0, 10, 10);
            bar
        }))
        .map_err(draw_err)?;
    Ok(())
}

/// `(days since origin, total)` pairs.
fn day_offsets(origin: NaiveDate, daily: &[DailyTotal]) -> Vec<(f64, f64)> {
    daily
        .iter()
        .map(|d| ((d.date - origin).num_days() as f64, d.total))
        .collect()
}

fn date_tick(origin: NaiveDate, v: f64) -> String {
    if v < 0.0 {
        return String::new();
    }
    origin
        .checked_add_days(Days::new(v.round() as u64))
        .map(|d| d.format("%m-%d").to_string())
        .unwrap_or_default()
}

/// Upper y bound with 10% headroom; never zero.
fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0_f64, f64::max);
    if max > 0.0 { max * 1.1 } else { 1.0 }
}

fn draw_err<E: std::fmt::Display>(e: E) -> AppError {
    AppError::new(ErrorKind::Output, format!("Chart rendering failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> SalesSummary {
        let day = |d| NaiveDate::from_ymd_opt(2025, 10, d).unwrap();
        SalesSummary {
            total_sales: 600.0,
            avg_daily_sales: 200.0,
            top_region: Some("East".to_string()),
            top_region_sales: Some(400.0),
            bottom_region: Some("North".to_string()),
            data_days: 3,
            record_count: 3,
            region_totals: vec![
                RegionTotal {
                    region: "East".to_string(),
                    total: 400.0,
                },
                RegionTotal {
                    region: "North".to_string(),
                    total: 200.0,
                },
            ],
            daily_totals: vec![
                DailyTotal { date: day(1), total: 100.0 },
                DailyTotal { date: day(2), total: 300.0 },
                DailyTotal { date: day(4), total: 200.0 },
            ],
            regions: Vec::new(),
        }
    }

    #[test]
    fn chart_is_written_as_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CHART_FILE_NAME);
        render_sales_chart(&path, &summary()).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Daily Sales Trend"));
        assert!(svg.contains("Sales by Region"));
    }

    #[test]
    fn empty_summary_is_an_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = summary();
        s.daily_totals.clear();
        let err = render_sales_chart(&dir.path().join("x.svg"), &s).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Output);
    }

    #[test]
    fn gaps_between_days_keep_calendar_spacing() {
        let s = summary();
        let pts = day_offsets(s.daily_totals[0].date, &s.daily_totals);
        assert_eq!(pts.iter().map(|p| p.0).collect::<Vec<_>>(), vec![0.0, 1.0, 3.0]);
        assert_eq!(date_tick(s.daily_totals[0].date, 3.0), "10-04");
        assert_eq!(date_tick(s.daily_totals[0].date, -0.5), "");
    }
}
