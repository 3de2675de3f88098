//! Machine-readable exports.
//!
//! - the JSON response envelope (success and error forms)
//! - the cleaned dataset as CSV under the canonical headers
//! - raw entry rows as CSV (sample generator output)

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use crate::app::pipeline::AnalysisResult;
use crate::domain::{CleanDataset, EntryRow, ForecastRow, Metrics};
use crate::error::{AppError, ErrorKind};
use crate::io::ingest::CANONICAL_HEADERS;

#[derive(Debug, Serialize)]
struct DataSection<'a> {
    total_sales: f64,
    avg_daily_sales: f64,
    top_region: Option<&'a str>,
    data_days: usize,
}

#[derive(Debug, Serialize)]
struct ReportsSection<'a> {
    excel: &'a Path,
    pdf: &'a Path,
    charts_dir: &'a Path,
}

#[derive(Debug, Serialize)]
struct ResultsSection<'a> {
    data: DataSection<'a>,
    charts: &'a Path,
    prediction: &'a [ForecastRow],
    metrics: &'a Metrics,
    reports: ReportsSection<'a>,
}

/// `{"status":"success","results":{...}}` for a finished analysis.
pub fn success_envelope(result: &AnalysisResult) -> Value {
    let s = &result.summary;
    let results = ResultsSection {
        data: DataSection {
            total_sales: s.total_sales,
            avg_daily_sales: s.avg_daily_sales,
            top_region: s.top_region.as_deref(),
            data_days: s.data_days,
        },
        charts: &result.artifacts.chart,
        prediction: &result.forecast,
        metrics: &result.metrics,
        reports: ReportsSection {
            excel: &result.artifacts.excel,
            pdf: &result.artifacts.pdf,
            charts_dir: &result.artifacts.charts_dir,
        },
    };
    json!({ "status": "success", "results": results })
}

/// `{"status":"error","kind":...,"message":...}`; carries nothing beyond
/// the error itself.
pub fn error_envelope(err: &AppError) -> Value {
    json!({
        "status": "error",
        "kind": err.kind().label(),
        "message": err.message(),
    })
}

/// Pretty-print a JSON value to `path`.
pub fn write_json(path: &Path, value: &Value) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(ErrorKind::Output, format!("Failed to create JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(&mut file, value)
        .map_err(|e| AppError::new(ErrorKind::Output, format!("Failed to write JSON: {e}")))?;
    writeln!(file).map_err(|e| AppError::new(ErrorKind::Output, format!("Failed to write JSON: {e}")))?;
    Ok(())
}

/// Write cleaned records with dates rendered in `date_format`.
///
/// Amounts are written at full precision so the file matches the cleaned data.
pub fn write_clean_csv(path: &Path, data: &CleanDataset, date_format: &str) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(ErrorKind::Output, format!("Failed to create CSV '{}': {e}", path.display()))
    })?;
    let row_err = |e: csv::Error| AppError::new(ErrorKind::Output, format!("Failed to write CSV row: {e}"));

    writer.write_record(CANONICAL_HEADERS).map_err(row_err)?;
    for r in data.records() {
        writer
            .write_record([
                r.date.format(date_format).to_string(),
                r.product_id.clone(),
                r.sales_amount.to_string(),
                r.region.clone(),
            ])
            .map_err(row_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(ErrorKind::Output, format!("Failed to flush CSV: {e}")))?;

    info!(path = %path.display(), rows = data.len(), "cleaned data written");
    Ok(())
}

/// Write entered or generated rows as a delimited source file.
///
/// A missing amount is written as an empty field.
pub fn write_entry_csv(path: &Path, rows: &[EntryRow]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(ErrorKind::Output, format!("Failed to create CSV '{}': {e}", path.display()))
    })?;
    let row_err = |e: csv::Error| AppError::new(ErrorKind::Output, format!("Failed to write CSV row: {e}"));

    writer.write_record(CANONICAL_HEADERS).map_err(row_err)?;
    for r in rows {
        let amount = r.sales_amount.map(|v| v.to_string()).unwrap_or_default();
        writer
            .write_record([r.date.as_str(), r.product_id.as_str(), amount.as_str(), r.region.as_str()])
            .map_err(row_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(ErrorKind::Output, format!("Failed to flush CSV: {e}")))?;

    info!(path = %path.display(), rows = rows.len(), "rows written");
    Ok(())
}
