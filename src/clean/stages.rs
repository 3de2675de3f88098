//! The individual cleaning stages.
//!
//! Each stage is a pure function from `&Dataset` to a new `Dataset` plus a
//! `StageReport` describing what it touched. None of them mutate their input.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::Dataset;
use crate::error::{AppError, ErrorKind};
use crate::math::{IqrBounds, iqr_bounds};

/// Source-market region names and their canonical labels.
pub const REGION_LOOKUP: [(&str, &str); 7] = [
    ("华北", "North"),
    ("华东", "East"),
    ("华南", "South"),
    ("西北", "Northwest"),
    ("西南", "Southwest"),
    ("东北", "Northeast"),
    ("中部", "Central"),
];

/// Named cleaning transformations, in the only order the pipeline allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    NormalizeCategories,
    ImputeMissing,
    NormalizeDates,
    RejectOutliers,
}

impl StageKind {
    pub fn display_name(self) -> &'static str {
        match self {
            StageKind::NormalizeCategories => "region normalization",
            StageKind::ImputeMissing => "missing-value imputation",
            StageKind::NormalizeDates => "date normalization",
            StageKind::RejectOutliers => "outlier rejection",
        }
    }

    pub fn apply(self, input: &Dataset, opts: &CleaningOptions) -> Result<StageOutput, AppError> {
        match self {
            StageKind::NormalizeCategories => Ok(normalize_regions(input)),
            StageKind::ImputeMissing => impute_missing_sales(input),
            StageKind::NormalizeDates => Ok(normalize_dates(input, &opts.date_format)),
            StageKind::RejectOutliers => Ok(reject_outliers(input, opts.iqr_multiplier)),
        }
    }
}

/// Knobs the stages read.
#[derive(Debug, Clone)]
pub struct CleaningOptions {
    pub date_format: String,
    pub iqr_multiplier: f64,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            date_format: crate::domain::DEFAULT_DATE_FORMAT.to_string(),
            iqr_multiplier: crate::domain::DEFAULT_IQR_MULTIPLIER,
        }
    }
}

/// What a stage did. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: StageKind,
    pub rows_in: usize,
    pub rows_out: usize,
    /// Values rewritten in place (labels mapped, amounts filled).
    pub values_changed: usize,
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iqr_bounds: Option<IqrBounds>,
}

impl StageReport {
    pub fn rows_dropped(&self) -> usize {
        self.rows_in.saturating_sub(self.rows_out)
    }
}

#[derive(Debug, Clone)]
pub struct StageOutput {
    pub dataset: Dataset,
    pub report: StageReport,
}

/// Map known source-market region names to canonical labels.
pub fn normalize_regions(input: &Dataset) -> StageOutput {
    let lookup: HashMap<&str, &str> = REGION_LOOKUP.into_iter().collect();
    let mut out = input.clone();
    let mut changed = 0usize;

    for r in &mut out.records {
        if let Some(&canonical) = lookup.get(r.region.as_str()) {
            r.region = canonical.to_string();
            changed += 1;
        }
    }

    let n = out.len();
    StageOutput {
        dataset: out,
        report: StageReport {
            stage: StageKind::NormalizeCategories,
            rows_in: n,
            rows_out: n,
            values_changed: changed,
            note: format!("Mapped {changed} region labels to canonical names"),
            iqr_bounds: None,
        },
    }
}

/// Fill each missing amount with the mean of the other rows of its product.
///
/// Means come from the whole input (not a running mean). A product whose rows
/// are all missing cannot be imputed and fails the stage.
pub fn impute_missing_sales(input: &Dataset) -> Result<StageOutput, AppError> {
    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();
    for r in &input.records {
        if let Some(v) = r.sales_amount {
            let e = totals.entry(r.product_id.as_str()).or_insert((0.0, 0));
            e.0 += v;
            e.1 += 1;
        }
    }

    let mut out = input.clone();
    let mut filled = 0usize;
    for r in &mut out.records {
        if r.sales_amount.is_some() {
            continue;
        }
        let Some(&(sum, count)) = totals.get(r.product_id.as_str()) else {
            return Err(AppError::new(
                ErrorKind::ImputationImpossible,
                format!(
                    "Cannot impute sales for product '{}': every row of this product is missing a sales amount.",
                    r.product_id
                ),
            ));
        };
        r.sales_amount = Some(sum / count as f64);
        filled += 1;
    }

    let n = out.len();
    Ok(StageOutput {
        dataset: out,
        report: StageReport {
            stage: StageKind::ImputeMissing,
            rows_in: n,
            rows_out: n,
            values_changed: filled,
            note: format!("Filled {filled} sales values (by product mean)"),
            iqr_bounds: None,
        },
    })
}

/// Parse every raw date with `format`; rows that fail are dropped.
///
/// Rows that already carry a parsed date keep it.
pub fn normalize_dates(input: &Dataset, format: &str) -> StageOutput {
    let mut records = Vec::with_capacity(input.len());
    for r in &input.records {
        let parsed = r.date.or_else(|| NaiveDate::parse_from_str(r.date_raw.trim(), format).ok());
        if let Some(date) = parsed {
            let mut kept = r.clone();
            kept.date = Some(date);
            records.push(kept);
        }
    }

    let dropped = input.len() - records.len();
    StageOutput {
        report: StageReport {
            stage: StageKind::NormalizeDates,
            rows_in: input.len(),
            rows_out: records.len(),
            values_changed: 0,
            note: format!("Removed {dropped} invalid dates (expected format {format})"),
            iqr_bounds: None,
        },
        dataset: Dataset::new(records),
    }
}

/// Drop negative amounts, then drop rows outside the IQR fences.
///
/// The fences are computed from the rows that survive the negative filter.
/// Rows without an amount are neither judged nor dropped.
pub fn reject_outliers(input: &Dataset, k: f64) -> StageOutput {
    let non_negative: Vec<_> = input
        .records
        .iter()
        .filter(|r| r.sales_amount.is_none_or(|v| v >= 0.0))
        .cloned()
        .collect();
    let negative_count = input.len() - non_negative.len();

    let amounts: Vec<f64> = non_negative.iter().filter_map(|r| r.sales_amount).collect();
    let bounds = iqr_bounds(&amounts, k);

    let kept: Vec<_> = match bounds {
        Some(b) => non_negative
            .iter()
            .filter(|r| r.sales_amount.is_none_or(|v| b.contains(v)))
            .cloned()
            .collect(),
        None => non_negative.clone(),
    };
    let extreme_count = non_negative.len() - kept.len();

    StageOutput {
        report: StageReport {
            stage: StageKind::RejectOutliers,
            rows_in: input.len(),
            rows_out: kept.len(),
            values_changed: 0,
            note: format!("Removed {negative_count} negative sales + {extreme_count} extreme values"),
            iqr_bounds: bounds,
        },
        dataset: Dataset::new(kept),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;

    fn rec(line: usize, date: &str, product: &str, amount: Option<f64>, region: &str) -> Record {
        Record {
            line,
            date_raw: date.to_string(),
            date: None,
            product_id: product.to_string(),
            sales_amount: amount,
            region: region.to_string(),
        }
    }

    #[test]
    fn regions_map_through_lookup_and_unknowns_pass() {
        let input = Dataset::new(vec![
            rec(2, "10/01/2025", "P1", Some(1.0), "华北"),
            rec(3, "10/02/2025", "P1", Some(1.0), "Atlantis"),
        ]);
        let out = normalize_regions(&input);
        assert_eq!(out.dataset.records[0].region, "North");
        assert_eq!(out.dataset.records[1].region, "Atlantis");
        assert_eq!(out.report.values_changed, 1);
        // Input untouched.
        assert_eq!(input.records[0].region, "华北");
    }

    #[test]
    fn imputation_uses_mean_of_other_rows_of_same_product() {
        let input = Dataset::new(vec![
            rec(2, "10/01/2025", "P1", Some(100.0), "North"),
            rec(3, "10/02/2025", "P1", None, "North"),
            rec(4, "10/03/2025", "P1", Some(300.0), "North"),
            rec(5, "10/04/2025", "P2", Some(9_999.0), "North"),
        ]);
        let out = impute_missing_sales(&input).unwrap();
        assert_eq!(out.dataset.records[1].sales_amount, Some(200.0));
        assert_eq!(out.report.values_changed, 1);
        assert_eq!(input.records[1].sales_amount, None);
    }

    #[test]
    fn imputation_fails_when_a_product_has_no_amounts() {
        let input = Dataset::new(vec![
            rec(2, "10/01/2025", "P1", Some(100.0), "North"),
            rec(3, "10/02/2025", "P9", None, "North"),
            rec(4, "10/03/2025", "P9", None, "North"),
        ]);
        let err = impute_missing_sales(&input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImputationImpossible);
        assert!(err.message().contains("P9"));
    }

    #[test]
    fn imputation_counts_rows_with_bad_dates() {
        // The bad-date row still contributes to the product mean.
        let input = Dataset::new(vec![
            rec(2, "not-a-date", "P1", Some(1_000.0), "North"),
            rec(3, "10/02/2025", "P1", None, "North"),
            rec(4, "10/03/2025", "P1", Some(2_000.0), "North"),
        ]);
        let out = impute_missing_sales(&input).unwrap();
        assert_eq!(out.dataset.records[1].sales_amount, Some(1_500.0));
    }

    #[test]
    fn unparseable_dates_are_dropped_and_counted() {
        let input = Dataset::new(vec![
            rec(2, "10/25/2025", "P1", Some(1.0), "North"),
            rec(3, "invalid_date", "P1", Some(1.0), "North"),
            rec(4, "2025-10-27", "P1", Some(1.0), "North"),
        ]);
        let out = normalize_dates(&input, "%m/%d/%Y");
        assert_eq!(out.dataset.len(), 1);
        assert_eq!(out.report.rows_dropped(), 2);
        assert_eq!(out.dataset.records[0].date, NaiveDate::from_ymd_opt(2025, 10, 25));
    }

    #[test]
    fn negatives_are_removed_before_iqr_fences() {
        let amounts = [-500.0, 100.0, 200.0, 300.0, 100_000.0];
        let input = Dataset::new(
            amounts
                .iter()
                .enumerate()
                .map(|(i, &a)| rec(i + 2, "10/01/2025", "P1", Some(a), "North"))
                .collect(),
        );

        let out = reject_outliers(&input, 1.5);
        let b = out.report.iqr_bounds.unwrap();
        // Fences come from [100, 200, 300, 100000] only.
        assert!((b.q1 - 175.0).abs() < 1e-9);
        assert!((b.q3 - 25_225.0).abs() < 1e-9);
        assert!((b.upper - 62_800.0).abs() < 1e-9);

        let kept: Vec<f64> = out.dataset.records.iter().filter_map(|r| r.sales_amount).collect();
        assert_eq!(kept, vec![100.0, 200.0, 300.0]);
        assert_eq!(out.report.note, "Removed 1 negative sales + 1 extreme values");
    }

    #[test]
    fn outlier_stage_on_empty_input_is_a_no_op() {
        let out = reject_outliers(&Dataset::default(), 1.5);
        assert!(out.dataset.is_empty());
        assert!(out.report.iqr_bounds.is_none());
    }
}
