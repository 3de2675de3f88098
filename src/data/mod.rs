//! Demo data.
//!
//! - `sample`: seeded synthetic month of sales records

pub mod sample;

pub use sample::*;
