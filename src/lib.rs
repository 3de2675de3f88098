//! `datamind` library crate.
//!
//! The binary (`datamind`) is a thin wrapper around this library so that:
//!
//! - the cleaning and forecasting pipeline is testable without spawning processes
//! - a session front-end (upload, save, analyze) can reuse the same pipeline
//! - each stage stays easy to find: ingest, clean, features, forecast, report

pub mod app;
pub mod clean;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod forecast;
pub mod forest;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
