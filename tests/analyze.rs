use std::fs;
use std::path::{Path, PathBuf};

use datamind::app::pipeline::analyze;
use datamind::app::session::Session;
use datamind::clean::StageKind;
use datamind::data::{SampleSpec, generate_sample};
use datamind::domain::{AnalysisConfig, EntryRow};
use datamind::error::ErrorKind;
use datamind::forecast::round_currency;
use datamind::io::{error_envelope, success_envelope, write_entry_csv};

/// One product in one region for every day of October 2025, with a missing
/// amount on day 5, a negative amount on day 10 and a spike on day 15.
fn october_rows() -> Vec<EntryRow> {
    (1..=31)
        .map(|d| {
            let amount = match d {
                5 => None,
                10 => Some(-500.0),
                15 => Some(5_000.0),
                _ => Some(1_000.0 + 10.0 * f64::from(d)),
            };
            EntryRow {
                date: format!("10/{d:02}/2025"),
                product_id: "P1".to_string(),
                sales_amount: amount,
                region: "华北".to_string(),
            }
        })
        .collect()
}

fn write_source(dir: &Path, rows: &[EntryRow]) -> PathBuf {
    let path = dir.join("october.csv");
    write_entry_csv(&path, rows).unwrap();
    path
}

fn small_config() -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.forest.n_estimators = 25;
    config
}

#[test]
fn single_region_month_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path(), &october_rows());
    let report_dir = dir.path().join("reports");

    let result = analyze(&source, &report_dir, &small_config()).unwrap();

    // Cleaning: the negative row and the spike go, the missing value is filled.
    assert_eq!(result.cleaning.rows_in, 31);
    assert_eq!(result.summary.record_count, 29);
    assert_eq!(result.cleaning.stage(StageKind::ImputeMissing).unwrap().values_changed, 1);
    assert_eq!(
        result.cleaning.stage(StageKind::RejectOutliers).unwrap().note,
        "Removed 1 negative sales + 1 extreme values"
    );

    // Days 1-20 train (minus days 10 and 15), days 21-31 evaluate.
    assert_eq!(result.train_rows, 18);
    assert_eq!(result.eval_rows, 11);
    assert!(result.metrics.mae >= 0.0 && result.metrics.rmse >= result.metrics.mae);

    assert_eq!(result.regions.labels(), ["North"]);
    assert_eq!(result.summary.top_region.as_deref(), Some("North"));
    assert_eq!(result.summary.data_days, 29);
    assert_eq!(result.period_start.to_string(), "2025-11-01");

    assert_eq!(result.forecast.len(), 5);
    for (i, row) in result.forecast.iter().enumerate() {
        assert_eq!(row.day_of_month as usize, i + 1);
        assert_eq!((row.region_code, row.product_code), (0, 0));
        assert!(row.predicted_amount >= 0.0);
        assert_eq!(row.predicted_amount, round_currency(row.predicted_amount));
    }

    let a = &result.artifacts;
    assert!(a.chart.is_file());
    assert!(a.excel.is_file());
    assert!(a.pdf.is_file());
    assert_eq!(a.chart.parent(), Some(a.charts_dir.as_path()));
    assert!(a.charts_dir.starts_with(&report_dir));
}

#[test]
fn identical_inputs_give_identical_forecasts() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path(), &october_rows());

    let first = analyze(&source, &dir.path().join("r1"), &small_config()).unwrap();
    let second = analyze(&source, &dir.path().join("r2"), &small_config()).unwrap();
    assert_eq!(first.forecast, second.forecast);
    assert_eq!(first.metrics, second.metrics);
}

#[test]
fn success_envelope_has_the_response_shape() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path(), &october_rows());
    let result = analyze(&source, &dir.path().join("reports"), &small_config()).unwrap();

    let v = success_envelope(&result);
    assert_eq!(v["status"], "success");
    let results = &v["results"];
    assert_eq!(results["data"]["data_days"], 29);
    assert_eq!(results["data"]["top_region"], "North");
    assert!(results["data"]["total_sales"].as_f64().unwrap() > 0.0);
    assert_eq!(results["prediction"].as_array().unwrap().len(), 5);
    assert!(results["prediction"][0]["predicted_amount"].is_number());
    assert!(results["metrics"]["mae"].is_number());
    assert!(results["charts"].as_str().unwrap().ends_with("sales_analysis_charts.svg"));
    assert!(results["reports"]["excel"].as_str().unwrap().ends_with(".xlsx"));
    assert!(results["reports"]["pdf"].as_str().unwrap().ends_with(".pdf"));
}

#[test]
fn failed_run_writes_no_reports() {
    let dir = tempfile::tempdir().unwrap();
    // Nothing after day 20: the evaluation window is empty.
    let rows: Vec<EntryRow> = october_rows().into_iter().take(20).collect();
    let source = write_source(dir.path(), &rows);
    let report_dir = dir.path().join("reports");

    let err = analyze(&source, &report_dir, &small_config()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientData);
    assert!(!report_dir.exists());

    let v = error_envelope(&err);
    assert_eq!(v["status"], "error");
    assert_eq!(v["kind"], "insufficient_data");
}

#[test]
fn missing_source_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = analyze(&dir.path().join("absent.csv"), &dir.path().join("r"), &small_config()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceNotFound);
}

#[test]
fn session_saves_rows_then_analyzes_them() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(dir.path().join("uploads"), dir.path().join("reports"));

    let saved = session.save_records(&october_rows()).unwrap();
    assert!(saved.starts_with(dir.path().join("uploads")));

    let report_dir = dir.path().join("session-report");
    let result = session.analyze(Some(&report_dir), &small_config()).unwrap();
    assert_eq!(result.source, saved);
    assert_eq!(result.summary.record_count, 29);
    assert!(result.artifacts.pdf.is_file());
}

#[test]
fn session_upload_of_a_generated_sample() {
    let dir = tempfile::tempdir().unwrap();
    let rows = generate_sample(&SampleSpec::default()).unwrap();
    let source = write_source(dir.path(), &rows);

    let mut session = Session::new(dir.path().join("uploads"), dir.path().join("reports"));
    session.upload(&source).unwrap();
    let result = session.analyze(None, &small_config()).unwrap();

    // Three regions and two products, cycled over the horizon.
    let codes: Vec<(usize, usize)> = result.forecast.iter().map(|r| (r.region_code, r.product_code)).collect();
    assert_eq!(codes, vec![(0, 0), (1, 1), (2, 0), (0, 1), (1, 0)]);
    assert!(result.artifacts.excel.starts_with(dir.path().join("reports")));
    assert!(fs::read_dir(dir.path().join("reports")).unwrap().count() >= 1);
}
