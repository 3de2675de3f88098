//! Command-line parsing for the sales analyzer.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline code; `app` maps these args into an `AnalysisConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_DATE_FORMAT, DEFAULT_HORIZON_DAYS, DEFAULT_IQR_MULTIPLIER, DEFAULT_SPLIT_DAY};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "datamind", version, about = "Sales data cleaning, forecasting and reporting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Clean a sales file, train the forecaster and write the reports.
    Analyze(AnalyzeArgs),
    /// Run only the cleaning pipeline and write the cleaned rows to CSV.
    Clean(CleanArgs),
    /// Write a seeded synthetic month of sales data.
    Sample(SampleArgs),
}

/// Options shared by every command that reads a data file.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Sales data file (.csv, .txt, .xlsx, .xls, .xlsm, .ods).
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: PathBuf,

    /// chrono pattern of the date column.
    #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
    pub date_format: String,

    /// IQR fence multiplier for outlier rejection.
    #[arg(long = "iqr-k", default_value_t = DEFAULT_IQR_MULTIPLIER)]
    pub iqr_k: f64,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Report directory (default: $DATAMIND_REPORT_ROOT or ./reports, plus a timestamp).
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// Last day of the month used for training; later days are evaluated.
    #[arg(long, default_value_t = DEFAULT_SPLIT_DAY)]
    pub split_day: u32,

    /// Number of trees in the forest.
    #[arg(long, default_value_t = 100)]
    pub trees: usize,

    /// Maximum depth of each tree.
    #[arg(long, default_value_t = 8)]
    pub max_depth: usize,

    /// Random seed for bootstrap sampling.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of days to forecast.
    #[arg(long, default_value_t = DEFAULT_HORIZON_DAYS)]
    pub horizon: usize,

    /// Also write the JSON result envelope to this file.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct CleanArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output CSV for the cleaned rows.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output CSV.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: PathBuf,

    #[arg(long, default_value_t = 2025)]
    pub year: i32,

    #[arg(long, default_value_t = 10)]
    pub month: u32,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of products (one row per product per day).
    #[arg(long, default_value_t = 2)]
    pub products: usize,

    /// Number of regions (at most 7).
    #[arg(long, default_value_t = 3)]
    pub regions: usize,

    /// Rows with a missing amount.
    #[arg(long, default_value_t = 1)]
    pub missing: usize,

    /// Rows with a negative amount.
    #[arg(long, default_value_t = 1)]
    pub negative: usize,

    /// Rows with an extreme spike.
    #[arg(long, default_value_t = 1)]
    pub spikes: usize,
}
