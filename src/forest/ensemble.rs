//! Bootstrap-aggregated regression forest.
//!
//! Each tree is grown on a bootstrap resample of the training rows, drawn from
//! its own RNG seeded with `seed + tree_index`. Trees are grown in parallel,
//! but because every tree owns its seed and rayon's indexed `collect` keeps
//! tree order, the fitted forest (and its predictions) is identical for a
//! given seed regardless of thread count.

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::error::{AppError, ErrorKind};
use crate::forest::tree::{RegressionTree, TreeParams};

/// Forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 8,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestParams {
    fn validate(&self) -> Result<(), AppError> {
        if self.n_estimators == 0 {
            return Err(AppError::new(ErrorKind::ModelFit, "Forest needs at least one estimator."));
        }
        if self.max_depth == 0 {
            return Err(AppError::new(ErrorKind::ModelFit, "Tree max depth must be >= 1."));
        }
        if self.min_samples_split < 2 {
            return Err(AppError::new(ErrorKind::ModelFit, "min_samples_split must be >= 2."));
        }
        if self.min_samples_leaf == 0 {
            return Err(AppError::new(ErrorKind::ModelFit, "min_samples_leaf must be >= 1."));
        }
        Ok(())
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Fit the forest on `x` (one row per sample) and labels `y`.
    pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>, params: &ForestParams) -> Result<Self, AppError> {
        params.validate()?;

        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(AppError::new(ErrorKind::ModelFit, "No training rows to fit."));
        }
        if n_samples != y.len() {
            return Err(AppError::new(
                ErrorKind::ModelFit,
                format!("Feature/label length mismatch: {n_samples} rows vs {} labels.", y.len()),
            ));
        }
        if !x.iter().chain(y.iter()).all(|v| v.is_finite()) {
            return Err(AppError::new(ErrorKind::ModelFit, "Training data contains non-finite values."));
        }

        let tree_params = params.tree_params();
        let trees: Vec<RegressionTree> = (0..params.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let indices: Vec<usize> = if params.bootstrap {
                    let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(tree_idx as u64));
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                RegressionTree::fit(x, y, &indices, &tree_params)
            })
            .collect();

        Ok(Self {
            trees,
            n_features: x.ncols(),
        })
    }

    /// Mean of the per-tree predictions for one feature row.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        // Sequential sum keeps the floating-point result order-stable.
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Predict every row of `x`.
    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, AppError> {
        if x.ncols() != self.n_features {
            return Err(AppError::new(
                ErrorKind::ModelFit,
                format!("Expected {} features, got {}.", self.n_features, x.ncols()),
            ));
        }
        let preds: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let row: Vec<f64> = x.row(i).iter().copied().collect();
                self.predict_row(&row)
            })
            .collect();
        Ok(DVector::from_vec(preds))
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data() -> (DMatrix<f64>, DVector<f64>) {
        let xs: Vec<f64> = (1..=20).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|v| 3.0 * v + 1.0).collect();
        (DMatrix::from_row_slice(20, 1, &xs), DVector::from_vec(ys))
    }

    #[test]
    fn regressor_tracks_a_trend() {
        let (x, y) = linear_data();
        let forest = RandomForest::fit(&x, &y, &ForestParams { n_estimators: 25, ..Default::default() }).unwrap();
        assert_eq!(forest.n_trees(), 25);

        let preds = forest.predict(&x).unwrap();
        let mse: f64 = preds.iter().zip(y.iter()).map(|(p, a)| (p - a).powi(2)).sum::<f64>() / 20.0;
        assert!(mse < 25.0, "MSE too high: {mse}");
        assert!(forest.predict_row(&[2.0]) < forest.predict_row(&[19.0]));
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = linear_data();
        let params = ForestParams { n_estimators: 10, seed: 7, ..Default::default() };
        let a = RandomForest::fit(&x, &y, &params).unwrap();
        let b = RandomForest::fit(&x, &y, &params).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn invalid_params_are_model_fit_errors() {
        let (x, y) = linear_data();
        let err = RandomForest::fit(&x, &y, &ForestParams { n_estimators: 0, ..Default::default() }).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelFit);

        let empty = DMatrix::<f64>::zeros(0, 1);
        let err = RandomForest::fit(&empty, &DVector::zeros(0), &ForestParams::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelFit);
    }

    #[test]
    fn feature_count_is_checked_on_predict() {
        let (x, y) = linear_data();
        let forest = RandomForest::fit(&x, &y, &ForestParams { n_estimators: 3, ..Default::default() }).unwrap();
        assert!(forest.predict(&DMatrix::zeros(2, 3)).is_err());
    }
}
