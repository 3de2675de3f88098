//! Chart rendering.
//!
//! - `chart`: the two-panel SVG written next to the reports
//! - `ascii`: a fixed-size terminal plot of the daily trend

pub mod ascii;
pub mod chart;

pub use ascii::*;
pub use chart::*;
