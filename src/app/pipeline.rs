//! Shared analysis pipeline used by the CLI and the session.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> clean -> aggregate -> split -> train -> evaluate -> forecast -> reports
//!
//! Front-ends only decide where the inputs come from and how results are shown.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, Months, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::clean::{CleaningOptions, CleaningPipeline, CleaningReport};
use crate::domain::{AnalysisConfig, CategoryEncoding, CleanDataset, ForecastRow, Metrics};
use crate::error::{AppError, ErrorKind};
use crate::features::build_split;
use crate::forecast::{evaluate, forecast, train};
use crate::io::{
    PDF_FILE_NAME, ReportContent, SUMMARY_FILE_NAME, load_dataset, write_regional_summary, write_sales_report,
};
use crate::plot::{CHART_FILE_NAME, render_sales_chart};
use crate::report::{SalesSummary, summarize};

/// Name of the chart subdirectory inside a report directory.
pub const CHARTS_DIR_NAME: &str = "charts";

/// Files produced by one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    pub charts_dir: PathBuf,
    pub chart: PathBuf,
    pub excel: PathBuf,
    pub pdf: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(report_dir: &Path) -> Self {
        let charts_dir = report_dir.join(CHARTS_DIR_NAME);
        Self {
            chart: charts_dir.join(CHART_FILE_NAME),
            charts_dir,
            excel: report_dir.join(SUMMARY_FILE_NAME),
            pdf: report_dir.join(PDF_FILE_NAME),
        }
    }
}

/// Ingested and cleaned data, before any modeling.
#[derive(Debug, Clone)]
pub struct CleanRun {
    pub dataset: CleanDataset,
    pub report: CleaningReport,
}

/// All computed outputs of a single `analyze` run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub source: PathBuf,
    pub summary: SalesSummary,
    pub cleaning: CleaningReport,
    /// Region labels in code order.
    pub regions: CategoryEncoding,
    /// Product labels in code order.
    pub products: CategoryEncoding,
    pub train_rows: usize,
    pub eval_rows: usize,
    pub metrics: Metrics,
    /// First calendar day of the forecast period.
    pub period_start: NaiveDate,
    pub forecast: Vec<ForecastRow>,
    pub artifacts: ArtifactPaths,
}

impl AnalysisResult {
    pub fn forecast_total(&self) -> f64 {
        self.forecast.iter().map(|r| r.predicted_amount).sum()
    }
}

/// Ingest, clean and validate a source file.
pub fn load_and_clean(source: &Path, config: &AnalysisConfig) -> Result<CleanRun, AppError> {
    let raw = load_dataset(source, &config.date_format)?;
    let outcome = CleaningPipeline::standard().run(&raw, &CleaningOptions::from(config))?;
    let dataset = outcome.dataset.into_clean()?;
    Ok(CleanRun {
        dataset,
        report: outcome.report,
    })
}

/// Run the full analysis of `source` and write its reports into `report_dir`.
///
/// Fail-fast: the first error aborts the run, and any report file written by
/// the failed run is removed before the error is returned.
pub fn analyze(source: &Path, report_dir: &Path, config: &AnalysisConfig) -> Result<AnalysisResult, AppError> {
    let CleanRun { dataset, report } = load_and_clean(source, config)?;
    let summary = summarize(&dataset);

    let split = build_split(&dataset, config.split_day)?;
    let model = train(&split.train, &config.forest)?;
    let metrics = evaluate(&model, &split.eval)?;

    let region_codes = split.space.regions.cycled_codes(config.horizon_days);
    let product_codes = split.space.products.cycled_codes(config.horizon_days);
    let forecast_rows = forecast(&model, &region_codes, &product_codes, config.horizon_days)?;

    let last = dataset.last_date().ok_or_else(|| {
        AppError::new(ErrorKind::InsufficientData, "No dated records left after cleaning.")
    })?;
    let period_start = next_period_start(last)?;

    let result = AnalysisResult {
        source: source.to_path_buf(),
        summary,
        cleaning: report,
        regions: split.space.regions,
        products: split.space.products,
        train_rows: split.train.len(),
        eval_rows: split.eval.len(),
        metrics,
        period_start,
        forecast: forecast_rows,
        artifacts: ArtifactPaths::in_dir(report_dir),
    };

    write_reports(report_dir, &result)?;
    info!(
        source = %source.display(),
        report_dir = %report_dir.display(),
        forecast_total = %format!("{:.2}", result.forecast_total()),
        "analysis completed"
    );
    Ok(result)
}

/// First day of the month after `last`.
pub fn next_period_start(last: NaiveDate) -> Result<NaiveDate, AppError> {
    last.with_day(1)
        .and_then(|d| d.checked_add_months(Months::new(1)))
        .ok_or_else(|| AppError::new(ErrorKind::InsufficientData, format!("No forecast period after {last}.")))
}

fn write_reports(report_dir: &Path, result: &AnalysisResult) -> Result<(), AppError> {
    let paths = &result.artifacts;
    let mut set = ArtifactSet::default();
    set.ensure_dir(report_dir)?;
    set.ensure_dir(&paths.charts_dir)?;

    set.track(&paths.chart);
    render_sales_chart(&paths.chart, &result.summary)?;

    set.track(&paths.excel);
    write_regional_summary(&paths.excel, &result.summary.regions)?;

    set.track(&paths.pdf);
    write_sales_report(
        &paths.pdf,
        &ReportContent {
            summary: &result.summary,
            metrics: &result.metrics,
            forecast: &result.forecast,
            period_start: result.period_start,
            regions: &result.regions,
            products: &result.products,
            chart: &paths.chart,
            generated_at: Local::now().naive_local(),
        },
    )?;

    set.commit();
    Ok(())
}

/// Files and directories created by an in-progress run.
///
/// Dropping an uncommitted set removes everything it tracked, so a failed run
/// leaves no partial reports behind.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
    committed: bool,
}

impl ArtifactSet {
    /// Track a file about to be written.
    pub fn track(&mut self, path: &Path) {
        self.files.push(path.to_path_buf());
    }

    /// Create `dir` if needed; only directories created here are tracked.
    pub fn ensure_dir(&mut self, dir: &Path) -> Result<(), AppError> {
        if dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(dir).map_err(|e| {
            AppError::new(
                ErrorKind::Output,
                format!("Failed to create report directory '{}': {e}", dir.display()),
            )
        })?;
        self.dirs.push(dir.to_path_buf());
        Ok(())
    }

    /// Keep everything written so far.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for ArtifactSet {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for f in &self.files {
            if f.exists() {
                if let Err(e) = fs::remove_file(f) {
                    warn!(path = %f.display(), error = %e, "failed to remove partial artifact");
                }
            }
        }
        // Innermost first; non-empty directories are left alone.
        for d in self.dirs.iter().rev() {
            match fs::remove_dir(d) {
                Ok(()) => {}
                Err(e) if matches!(e.kind(), io::ErrorKind::DirectoryNotEmpty | io::ErrorKind::NotFound) => {}
                Err(e) => warn!(path = %d.display(), error = %e, "failed to remove partial report directory"),
            }
        }
    }
}
