//! Formatted terminal output.
//!
//! All formatting lives here so the pipeline code stays free of layout
//! concerns. Nothing in this module recomputes a statistic.

use chrono::{Days, NaiveDate};

use crate::app::pipeline::AnalysisResult;
use crate::clean::CleaningReport;
use crate::domain::{CategoryEncoding, ForecastRow};
use crate::report::RegionSummaryRow;

/// Calendar date of forecast day `day` (1-based) of the period.
pub fn forecast_date(period_start: NaiveDate, day: u32) -> NaiveDate {
    period_start
        .checked_add_days(Days::new(u64::from(day.saturating_sub(1))))
        .unwrap_or(period_start)
}

/// Short label such as `Nov 1`.
pub fn forecast_day_label(period_start: NaiveDate, day: u32) -> String {
    forecast_date(period_start, day).format("%b %-d").to_string()
}

/// Thousands-separated amount with 2 decimals (`1,234.50`).
pub fn fmt_amount(v: f64) -> String {
    let s = format!("{:.2}", v.abs());
    let (int_part, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if v < 0.0 && s != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

/// Format the full run summary: data, cleaning, model and artifacts.
pub fn format_run_summary(result: &AnalysisResult) -> String {
    let s = &result.summary;
    let mut out = String::new();

    out.push_str("=== datamind - Sales Analysis ===\n");
    out.push_str(&format!("Source: {}\n", result.source.display()));
    out.push_str(&format!(
        "Records: raw={} | clean={} | days={}\n",
        result.cleaning.rows_in, s.record_count, s.data_days
    ));
    out.push_str(&format!("Total sales: {}\n", fmt_amount(s.total_sales)));
    out.push_str(&format!("Average sales per record: {}\n", fmt_amount(s.avg_daily_sales)));
    if let (Some(top), Some(total)) = (&s.top_region, s.top_region_sales) {
        let share = s.top_region_share().map(|p| format!(", {p:.1}% of total")).unwrap_or_default();
        out.push_str(&format!("Top region: {top} ({}{share})\n", fmt_amount(total)));
    }
    if let Some(bottom) = &s.bottom_region {
        out.push_str(&format!("Bottom region: {bottom}\n"));
    }

    out.push_str("\nCleaning:\n");
    out.push_str(&format_cleaning_report(&result.cleaning));

    out.push_str("\nModel:\n");
    out.push_str(&format!(
        "- random forest | train={} eval={}\n",
        result.train_rows, result.eval_rows
    ));
    out.push_str(&format!(
        "- MAE={:.2} RMSE={:.2}\n",
        result.metrics.mae, result.metrics.rmse
    ));

    out.push_str("\nRegions:\n");
    out.push_str(&format_region_table(&result.summary.regions));

    out.push_str(&format!(
        "\nForecast ({} days from {}):\n",
        result.forecast.len(),
        result.period_start
    ));
    out.push_str(&format_forecast_table(
        &result.forecast,
        result.period_start,
        &result.regions,
        &result.products,
    ));
    out.push_str(&format!("Total forecast: {}\n", fmt_amount(result.forecast_total())));

    out.push_str("\nReports:\n");
    out.push_str(&format!("- chart: {}\n", result.artifacts.chart.display()));
    out.push_str(&format!("- excel: {}\n", result.artifacts.excel.display()));
    out.push_str(&format!("- pdf  : {}\n", result.artifacts.pdf.display()));

    out
}

/// One line per cleaning stage.
pub fn format_cleaning_report(report: &CleaningReport) -> String {
    let mut out = String::new();
    for (i, stage) in report.stages.iter().enumerate() {
        out.push_str(&format!(
            "{}. {:<26} {:>6} -> {:<6} {}\n",
            i + 1,
            stage.stage.display_name(),
            stage.rows_in,
            stage.rows_out,
            stage.note
        ));
    }
    if let Some(b) = report.iqr_bounds() {
        out.push_str(&format!(
            "   IQR fences: [{}, {}] (Q1={}, Q3={})\n",
            fmt_amount(b.lower),
            fmt_amount(b.upper),
            fmt_amount(b.q1),
            fmt_amount(b.q3)
        ));
    }
    out
}

pub fn format_region_table(rows: &[RegionSummaryRow]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<4} {:<14} {:>16} {:>14} {:>14} {:>7} {:>5}",
            "rank", "region", "total", "mean", "median", "orders", "days"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!(
        "{:-<4} {:-<14} {:-<16} {:-<14} {:-<14} {:-<7} {:-<5}\n",
        "", "", "", "", "", "", ""
    ));

    for r in rows {
        out.push_str(
            format!(
                "{:<4} {:<14} {:>16} {:>14} {:>14} {:>7} {:>5}",
                r.rank,
                truncate(&r.region, 14),
                fmt_amount(r.total_sales),
                fmt_amount(r.avg_sales),
                fmt_amount(r.median_sales),
                r.order_count,
                r.coverage_days
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

pub fn format_forecast_table(
    rows: &[ForecastRow],
    period_start: NaiveDate,
    regions: &CategoryEncoding,
    products: &CategoryEncoding,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<8} {:<14} {:<12} {:>14}\n",
        "date", "region", "product", "forecast"
    ));
    out.push_str(&format!("{:-<8} {:-<14} {:-<12} {:-<14}\n", "", "", "", ""));

    for r in rows {
        out.push_str(&format!(
            "{:<8} {:<14} {:<12} {:>14}\n",
            forecast_day_label(period_start, r.day_of_month),
            truncate(&code_label(regions, r.region_code), 14),
            truncate(&code_label(products, r.product_code), 12),
            fmt_amount(r.predicted_amount)
        ));
    }
    out
}

/// `label (code)`, or just the code when it is not in the encoding.
pub fn code_label(encoding: &CategoryEncoding, code: usize) -> String {
    match encoding.label(code) {
        Some(label) => format!("{label} ({code})"),
        None => code.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_grouped_by_thousands() {
        assert_eq!(fmt_amount(0.0), "0.00");
        assert_eq!(fmt_amount(999.999), "1,000.00");
        assert_eq!(fmt_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(fmt_amount(-4_500.5), "-4,500.50");
        assert_eq!(fmt_amount(-0.001), "0.00");
    }

    #[test]
    fn forecast_labels_follow_the_period() {
        let nov = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        assert_eq!(forecast_day_label(nov, 1), "Nov 1");
        assert_eq!(forecast_day_label(nov, 5), "Nov 5");
        assert_eq!(forecast_date(nov, 31), NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
    }

    #[test]
    fn forecast_table_resolves_codes_to_labels() {
        let regions = CategoryEncoding::from_labels(["North", "East"]);
        let products = CategoryEncoding::from_labels(["P1"]);
        let rows = [
            ForecastRow {
                day_of_month: 1,
                region_code: 1,
                product_code: 0,
                predicted_amount: 1_500.0,
            },
            ForecastRow {
                day_of_month: 2,
                region_code: 0,
                product_code: 7,
                predicted_amount: 20.25,
            },
        ];
        let nov = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        let txt = format_forecast_table(&rows, nov, &regions, &products);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("Nov 1"));
        assert!(lines[2].contains("East (1)"));
        assert!(lines[2].ends_with("1,500.00"));
        assert!(lines[3].contains(" 7 "));
    }

    #[test]
    fn long_labels_are_truncated() {
        assert_eq!(truncate("Northwest", 14), "Northwest");
        assert_eq!(truncate("abcdefgh", 5), "abcd.");
    }
}
