//! Training, evaluation and forecasting.
//!
//! Responsibilities:
//!
//! - fit a seeded random forest on the training rows
//! - report MAE/RMSE on the evaluation rows (informational, never gating)
//! - predict synthetic rows for the first days of the next period
//!
//! Forecast rows pair day `i` with `region_codes[i]` and `product_codes[i]`.
//! This is one synthetic region/product combination per day, not a full
//! cross-join of every region with every product.

use tracing::info;

use crate::domain::{FeatureRow, ForecastRow, LabeledRow, Metrics};
use crate::error::{AppError, ErrorKind};
use crate::features::{design, feature_matrix};
use crate::forest::{ForestParams, RandomForest};
use crate::math::regression_metrics;

/// A fitted sales model. Only prediction is exposed.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    forest: RandomForest,
}

impl TrainedModel {
    pub fn predict(&self, row: &FeatureRow) -> f64 {
        self.forest.predict_row(&row.to_array())
    }

    pub fn predict_many(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, AppError> {
        let preds = self.forest.predict(&feature_matrix(rows))?;
        Ok(preds.iter().copied().collect())
    }
}

/// Fit the forest on the training rows.
pub fn train(rows: &[LabeledRow], params: &ForestParams) -> Result<TrainedModel, AppError> {
    info!(
        rows = rows.len(),
        n_estimators = params.n_estimators,
        max_depth = params.max_depth,
        seed = params.seed,
        "training random forest"
    );
    let (x, y) = design(rows);
    let forest = RandomForest::fit(&x, &y, params)?;
    info!(trees = forest.n_trees(), "model training completed");
    Ok(TrainedModel { forest })
}

/// MAE and RMSE of the model on held-out rows.
pub fn evaluate(model: &TrainedModel, rows: &[LabeledRow]) -> Result<Metrics, AppError> {
    let features: Vec<FeatureRow> = rows.iter().map(|r| r.features).collect();
    let predicted = model.predict_many(&features)?;
    let actual: Vec<f64> = rows.iter().map(|r| r.sales_amount).collect();

    let metrics = regression_metrics(&actual, &predicted)
        .ok_or_else(|| AppError::new(ErrorKind::InsufficientData, "No evaluation rows to score the model on."))?;
    info!(mae = %format!("{:.2}", metrics.mae), rmse = %format!("{:.2}", metrics.rmse), "model evaluation");
    Ok(metrics)
}

/// Forecast days `1..=days` of the next period.
///
/// Day `i` (1-based) uses `region_codes[i - 1]` and `product_codes[i - 1]`.
/// Both lists must hold at least `days` codes.
pub fn forecast(
    model: &TrainedModel,
    region_codes: &[usize],
    product_codes: &[usize],
    days: usize,
) -> Result<Vec<ForecastRow>, AppError> {
    let supplied = region_codes.len().min(product_codes.len());
    if supplied < days {
        return Err(AppError::new(
            ErrorKind::InsufficientCodes,
            format!(
                "Forecasting {days} days needs {days} region and product codes; got {} region and {} product codes.",
                region_codes.len(),
                product_codes.len()
            ),
        ));
    }

    let rows: Vec<FeatureRow> = (0..days)
        .map(|i| FeatureRow {
            day_of_month: (i + 1) as u32,
            region_code: region_codes[i],
            product_code: product_codes[i],
        })
        .collect();
    let predicted = model.predict_many(&rows)?;

    Ok(rows
        .into_iter()
        .zip(predicted)
        .map(|(r, p)| ForecastRow {
            day_of_month: r.day_of_month,
            region_code: r.region_code,
            product_code: r.product_code,
            predicted_amount: round_currency(p),
        })
        .collect())
}

/// Round to 2 decimal places.
pub fn round_currency(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
