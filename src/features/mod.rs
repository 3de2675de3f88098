//! Feature derivation and the calendar train/evaluation split.
//!
//! Features per row: day of month, region code, product code. Codes come from
//! first-appearance encodings over the whole cleaned dataset, built once here
//! and carried in `FeatureSpace` so training and forecasting share them.

use chrono::Datelike;
use nalgebra::{DMatrix, DVector};
use tracing::info;

use crate::domain::{CategoryEncoding, CleanDataset, CleanRecord, FeatureRow, LabeledRow};
use crate::error::{AppError, ErrorKind};

/// Encodings that define the model's categorical feature codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSpace {
    pub regions: CategoryEncoding,
    pub products: CategoryEncoding,
}

impl FeatureSpace {
    pub fn from_dataset(data: &CleanDataset) -> Self {
        Self {
            regions: CategoryEncoding::from_labels(data.records().iter().map(|r| r.region.as_str())),
            products: CategoryEncoding::from_labels(data.records().iter().map(|r| r.product_id.as_str())),
        }
    }

    /// Encode one record; `None` if a label is unknown to this space.
    pub fn encode(&self, record: &CleanRecord) -> Option<FeatureRow> {
        Some(FeatureRow {
            day_of_month: record.date.day(),
            region_code: self.regions.code(&record.region)?,
            product_code: self.products.code(&record.product_id)?,
        })
    }
}

/// Rows on each side of the calendar cutoff.
#[derive(Debug, Clone)]
pub struct TemporalSplit {
    pub space: FeatureSpace,
    pub split_day: u32,
    /// `day_of_month <= split_day`.
    pub train: Vec<LabeledRow>,
    /// `day_of_month > split_day`.
    pub eval: Vec<LabeledRow>,
}

/// Encode the cleaned dataset and split it at `split_day`.
///
/// Fails with `InsufficientData` when either side is empty.
pub fn build_split(data: &CleanDataset, split_day: u32) -> Result<TemporalSplit, AppError> {
    let space = FeatureSpace::from_dataset(data);

    let mut train = Vec::new();
    let mut eval = Vec::new();
    for r in data.records() {
        // Every label of `data` is in `space` by construction.
        let Some(features) = space.encode(r) else { continue };
        let row = LabeledRow {
            features,
            sales_amount: r.sales_amount,
        };
        if features.day_of_month <= split_day {
            train.push(row);
        } else {
            eval.push(row);
        }
    }

    if train.is_empty() {
        return Err(AppError::new(
            ErrorKind::InsufficientData,
            format!("No training rows: no cleaned records fall on day {split_day} of the month or earlier."),
        ));
    }
    if eval.is_empty() {
        return Err(AppError::new(
            ErrorKind::InsufficientData,
            format!("No evaluation rows: no cleaned records fall after day {split_day} of the month."),
        ));
    }

    info!(
        train = train.len(),
        eval = eval.len(),
        split_day,
        regions = space.regions.len(),
        products = space.products.len(),
        "model data prepared"
    );

    Ok(TemporalSplit {
        space,
        split_day,
        train,
        eval,
    })
}

/// Stack feature rows into a row-major design matrix.
pub fn feature_matrix(rows: &[FeatureRow]) -> DMatrix<f64> {
    let data: Vec<f64> = rows.iter().flat_map(|r| r.to_array()).collect();
    DMatrix::from_row_slice(rows.len(), FeatureRow::WIDTH, &data)
}

/// Split labeled rows into a design matrix and label vector.
pub fn design(rows: &[LabeledRow]) -> (DMatrix<f64>, DVector<f64>) {
    let features: Vec<FeatureRow> = rows.iter().map(|r| r.features).collect();
    let labels = DVector::from_iterator(rows.len(), rows.iter().map(|r| r.sales_amount));
    (feature_matrix(&features), labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dataset, Record};
    use chrono::NaiveDate;

    fn clean(days: &[(u32, &str, &str)]) -> CleanDataset {
        Dataset::new(
            days.iter()
                .enumerate()
                .map(|(i, &(d, region, product))| Record {
                    line: i + 2,
                    date_raw: String::new(),
                    date: NaiveDate::from_ymd_opt(2025, 10, d),
                    product_id: product.to_string(),
                    sales_amount: Some(100.0 * d as f64),
                    region: region.to_string(),
                })
                .collect(),
        )
        .into_clean()
        .unwrap()
    }

    #[test]
    fn day_twenty_trains_and_day_twenty_one_evaluates() {
        let data = clean(&[(19, "North", "A"), (20, "East", "B"), (21, "North", "B")]);
        let split = build_split(&data, 20).unwrap();
        assert_eq!(split.train.len(), 2);
        assert_eq!(split.eval.len(), 1);
        assert_eq!(split.train[1].features.day_of_month, 20);
        assert_eq!(split.eval[0].features.day_of_month, 21);
    }

    #[test]
    fn no_rows_after_cutoff_is_insufficient_data() {
        let data = clean(&[(1, "North", "A"), (20, "North", "A")]);
        let err = build_split(&data, 20).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);

        let data = clean(&[(25, "North", "A")]);
        assert_eq!(build_split(&data, 20).unwrap_err().kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn cutoff_is_configurable() {
        let data = clean(&[(10, "North", "A"), (11, "North", "A"), (20, "North", "A")]);
        let split = build_split(&data, 10).unwrap();
        assert_eq!(split.train.len(), 1);
        assert_eq!(split.eval.len(), 2);
    }

    #[test]
    fn codes_come_from_the_shared_encodings() {
        let data = clean(&[(1, "East", "B"), (2, "North", "A"), (25, "East", "A")]);
        let split = build_split(&data, 20).unwrap();
        assert_eq!(split.space.regions.labels(), ["East", "North"]);
        assert_eq!(split.space.products.labels(), ["B", "A"]);
        assert_eq!(
            split.eval[0].features,
            FeatureRow {
                day_of_month: 25,
                region_code: 0,
                product_code: 1
            }
        );
    }

    #[test]
    fn design_matrix_is_row_major() {
        let data = clean(&[(3, "North", "A"), (4, "East", "B"), (22, "East", "A")]);
        let split = build_split(&data, 20).unwrap();
        let (x, y) = design(&split.train);
        assert_eq!(x.nrows(), 2);
        assert_eq!(x[(1, 0)], 4.0);
        assert_eq!(x[(1, 1)], 1.0);
        assert_eq!(x[(1, 2)], 1.0);
        assert_eq!(y[1], 400.0);
    }
}
