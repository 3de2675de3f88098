//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and cleaned sales records (`Record`, `CleanRecord`) and their datasets
//! - category encodings shared by training and forecasting (`CategoryEncoding`)
//! - model-facing rows (`FeatureRow`, `ForecastRow`) and run configuration

pub mod encoding;
pub mod types;

pub use encoding::*;
pub use types::*;
