//! Cleaning pipeline.
//!
//! The pipeline is an explicit, ordered list of named stages:
//!
//! 1. region normalization
//! 2. missing-value imputation
//! 3. date normalization
//! 4. outlier rejection
//!
//! Imputation runs before date normalization, so rows whose date will later be
//! dropped still contribute to the per-product means.

pub mod stages;

pub use stages::*;

use serde::Serialize;
use tracing::info;

use crate::domain::{AnalysisConfig, Dataset};
use crate::error::AppError;
use crate::math::IqrBounds;

/// Ordered stage list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningPipeline {
    stages: Vec<StageKind>,
}

impl CleaningPipeline {
    /// The production order.
    pub fn standard() -> Self {
        Self {
            stages: vec![
                StageKind::NormalizeCategories,
                StageKind::ImputeMissing,
                StageKind::NormalizeDates,
                StageKind::RejectOutliers,
            ],
        }
    }

    /// A custom stage list (used to exercise stages in isolation).
    pub fn with_stages(stages: Vec<StageKind>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[StageKind] {
        &self.stages
    }

    /// Run every stage in order, stopping at the first failure.
    pub fn run(&self, input: &Dataset, opts: &CleaningOptions) -> Result<CleaningOutcome, AppError> {
        let mut current = input.clone();
        let mut reports = Vec::with_capacity(self.stages.len());

        for (step, stage) in self.stages.iter().enumerate() {
            let StageOutput { dataset, report } = stage.apply(&current, opts)?;
            info!(
                step = step + 1,
                stage = stage.display_name(),
                rows_in = report.rows_in,
                rows_out = report.rows_out,
                changed = report.values_changed,
                "{}",
                report.note
            );
            reports.push(report);
            current = dataset;
        }

        info!(rows_in = input.len(), rows_out = current.len(), "preprocessing completed");
        Ok(CleaningOutcome {
            report: CleaningReport {
                rows_in: input.len(),
                rows_out: current.len(),
                stages: reports,
            },
            dataset: current,
        })
    }
}

impl Default for CleaningPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl From<&AnalysisConfig> for CleaningOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            date_format: config.date_format.clone(),
            iqr_multiplier: config.iqr_multiplier,
        }
    }
}

/// Per-stage statistics for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub stages: Vec<StageReport>,
}

impl CleaningReport {
    pub fn stage(&self, kind: StageKind) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == kind)
    }

    /// Fences used by the outlier stage, when it ran on non-empty data.
    pub fn iqr_bounds(&self) -> Option<IqrBounds> {
        self.stage(StageKind::RejectOutliers).and_then(|s| s.iqr_bounds)
    }

    /// True when no stage dropped a row or rewrote a value.
    pub fn is_no_op(&self) -> bool {
        self.stages.iter().all(|s| s.rows_dropped() == 0 && s.values_changed == 0)
    }
}

#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub dataset: Dataset,
    pub report: CleaningReport,
}

/// Run the standard pipeline with default options.
pub fn clean_dataset(input: &Dataset) -> Result<CleaningOutcome, AppError> {
    CleaningPipeline::standard().run(input, &CleaningOptions::default())
}
