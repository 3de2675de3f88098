//! Regression error metrics.

use crate::domain::Metrics;

/// Mean absolute error; `None` when lengths differ or inputs are empty.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let sum: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum();
    Some(sum / actual.len() as f64)
}

/// Root mean squared error; `None` when lengths differ or inputs are empty.
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let sse: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    Some((sse / actual.len() as f64).sqrt())
}

/// Both metrics at once.
pub fn regression_metrics(actual: &[f64], predicted: &[f64]) -> Option<Metrics> {
    Some(Metrics {
        mae: mean_absolute_error(actual, predicted)?,
        rmse: root_mean_squared_error(actual, predicted)?,
    })
}
