//! Mathematical utilities: descriptive statistics and regression error metrics.

pub mod metrics;
pub mod stats;

pub use metrics::*;
pub use stats::*;
