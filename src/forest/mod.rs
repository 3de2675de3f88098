//! Tree-ensemble regression.
//!
//! - `tree`: a single CART regression tree
//! - `ensemble`: the seeded, bootstrap-aggregated forest built on it

pub mod ensemble;
pub mod tree;

pub use ensemble::*;
pub use tree::*;
