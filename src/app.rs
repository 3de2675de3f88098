//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the analysis / cleaning pipelines
//! - prints reports and plots
//! - writes the JSON envelope on request

use clap::Parser;
use tracing::info;

use crate::cli::{AnalyzeArgs, CleanArgs, Command, InputArgs, SampleArgs};
use crate::data::{SampleSpec, generate_sample};
use crate::domain::AnalysisConfig;
use crate::error::AppError;
use crate::forest::ForestParams;

pub mod pipeline;
pub mod session;

/// Entry point for the `datamind` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Clean(args) => handle_clean(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args);
    let report_dir = args
        .report_dir
        .clone()
        .unwrap_or_else(|| session::Session::from_env().next_report_dir());

    let outcome = pipeline::analyze(&args.input.file, &report_dir, &config);

    // The envelope is written for failures too, so callers always get a body.
    if let Some(path) = &args.json {
        let envelope = match &outcome {
            Ok(result) => crate::io::success_envelope(result),
            Err(err) => crate::io::error_envelope(err),
        };
        crate::io::write_json(path, &envelope)?;
    }
    let result = outcome?;

    println!("{}", crate::report::format_run_summary(&result));
    if !args.no_plot {
        println!(
            "{}",
            crate::plot::render_daily_trend(&result.summary.daily_totals, args.width, args.height)
        );
    }
    Ok(())
}

fn handle_clean(args: CleanArgs) -> Result<(), AppError> {
    let config = cleaning_config_from_args(&args.input);
    let run = pipeline::load_and_clean(&args.input.file, &config)?;

    print!("{}", crate::report::format_cleaning_report(&run.report));
    crate::io::write_clean_csv(&args.output, &run.dataset, &config.date_format)?;
    println!(
        "Wrote {} cleaned rows to {}",
        run.dataset.len(),
        args.output.display()
    );
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let spec = SampleSpec {
        year: args.year,
        month: args.month,
        seed: args.seed,
        products: args.products,
        regions: args.regions,
        missing: args.missing,
        negative: args.negative,
        spikes: args.spikes,
    };
    let rows = generate_sample(&spec)?;
    crate::io::write_entry_csv(&args.output, &rows)?;
    info!(rows = rows.len(), seed = spec.seed, "sample generated");
    println!("Wrote {} sample rows to {}", rows.len(), args.output.display());
    Ok(())
}

pub fn analysis_config_from_args(args: &AnalyzeArgs) -> AnalysisConfig {
    AnalysisConfig {
        split_day: args.split_day,
        horizon_days: args.horizon,
        forest: ForestParams {
            n_estimators: args.trees,
            max_depth: args.max_depth,
            seed: args.seed,
            ..ForestParams::default()
        },
        ..cleaning_config_from_args(&args.input)
    }
}

fn cleaning_config_from_args(args: &InputArgs) -> AnalysisConfig {
    AnalysisConfig {
        date_format: args.date_format.clone(),
        iqr_multiplier: args.iqr_k,
        ..AnalysisConfig::default()
    }
}
