//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - passed stage to stage during cleaning
//! - exported to JSON/CSV/XLSX
//! - inspected directly in tests

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};
use crate::forest::ForestParams;

/// Input date pattern used when none is configured (`MM/DD/YYYY`).
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Last day of the month that still belongs to the training window.
pub const DEFAULT_SPLIT_DAY: u32 = 20;

/// Number of future days forecast per run.
pub const DEFAULT_HORIZON_DAYS: usize = 5;

/// Tukey fence multiplier for the IQR outlier rule.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// One observed sales event, as it flows through the cleaning stages.
///
/// The date is carried both as the verbatim source text and as an optional
/// parsed value; only the date normalization stage fills `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// 1-based source line (header is line 1).
    pub line: usize,
    pub date_raw: String,
    pub date: Option<NaiveDate>,
    pub product_id: String,
    pub sales_amount: Option<f64>,
    pub region: String,
}

/// Ordered collection of records sharing the canonical schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validate the post-cleaning invariants and freeze the dataset.
    ///
    /// Fails if any record lacks a parsed date or an amount, or carries a
    /// negative/non-finite amount.
    pub fn into_clean(self) -> Result<CleanDataset, AppError> {
        let mut records = Vec::with_capacity(self.records.len());
        for r in self.records {
            let date = r.date.ok_or_else(|| {
                AppError::new(
                    ErrorKind::Parse,
                    format!("Line {}: date '{}' was never normalized.", r.line, r.date_raw),
                )
            })?;
            let sales_amount = r.sales_amount.ok_or_else(|| {
                AppError::new(ErrorKind::Parse, format!("Line {}: sales amount is missing.", r.line))
            })?;
            if !sales_amount.is_finite() || sales_amount < 0.0 {
                return Err(AppError::new(
                    ErrorKind::Parse,
                    format!("Line {}: invalid sales amount {sales_amount}.", r.line),
                ));
            }
            records.push(CleanRecord {
                date,
                product_id: r.product_id,
                sales_amount,
                region: r.region,
            });
        }
        Ok(CleanDataset { records })
    }
}

/// A hand-entered row, saved to a workbook before analysis.
///
/// Values are stored exactly as entered; cleaning happens on the next analyze.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRow {
    pub date: String,
    pub product_id: String,
    pub sales_amount: Option<f64>,
    pub region: String,
}

/// A record that satisfies every cleaning invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub date: NaiveDate,
    pub product_id: String,
    pub sales_amount: f64,
    pub region: String,
}

/// Read-only output of the cleaning pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanDataset {
    records: Vec<CleanRecord>,
}

impl CleanDataset {
    pub fn records(&self) -> &[CleanRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Latest observed date, if any.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.date).max()
    }
}

/// Model input derived from one record plus the active encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub day_of_month: u32,
    pub region_code: usize,
    pub product_code: usize,
}

impl FeatureRow {
    /// Number of model features per row.
    pub const WIDTH: usize = 3;

    pub fn to_array(self) -> [f64; Self::WIDTH] {
        [
            f64::from(self.day_of_month),
            self.region_code as f64,
            self.product_code as f64,
        ]
    }
}

/// A feature row paired with its observed label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    pub features: FeatureRow,
    pub sales_amount: f64,
}

/// One forecast for a synthetic future row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub day_of_month: u32,
    pub region_code: usize,
    pub product_code: usize,
    pub predicted_amount: f64,
}

/// Regression accuracy on the evaluation window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub mae: f64,
    pub rmse: f64,
}

/// Resolved configuration for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// chrono pattern for the date column.
    pub date_format: String,
    pub iqr_multiplier: f64,
    pub split_day: u32,
    pub horizon_days: usize,
    pub forest: ForestParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            split_day: DEFAULT_SPLIT_DAY,
            horizon_days: DEFAULT_HORIZON_DAYS,
            forest: ForestParams::default(),
        }
    }
}
