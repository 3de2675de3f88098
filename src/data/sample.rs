//! Seeded synthetic month of sales records.
//!
//! One row per product per day. Regions are drawn from the source-market
//! names the cleaning stage knows how to map, and a configurable number of
//! rows are damaged (missing amount, negative amount, extreme spike) so the
//! full cleaning path is exercised.

use chrono::{Datelike, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::seq::index;
use rand_distr::Normal;

use crate::clean::REGION_LOOKUP;
use crate::domain::{DEFAULT_DATE_FORMAT, EntryRow};
use crate::error::{AppError, ErrorKind};

/// Multiplier applied to a row chosen as an extreme spike.
const SPIKE_FACTOR: f64 = 25.0;

#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub year: i32,
    pub month: u32,
    pub seed: u64,
    pub products: usize,
    pub regions: usize,
    pub missing: usize,
    pub negative: usize,
    pub spikes: usize,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            year: 2025,
            month: 10,
            seed: 42,
            products: 2,
            regions: 3,
            missing: 1,
            negative: 1,
            spikes: 1,
        }
    }
}

/// Generate the sample rows, ordered by date then product.
pub fn generate_sample(spec: &SampleSpec) -> Result<Vec<EntryRow>, AppError> {
    if spec.products == 0 {
        return Err(AppError::new(ErrorKind::Parse, "Sample needs at least one product."));
    }
    if spec.regions == 0 || spec.regions > REGION_LOOKUP.len() {
        return Err(AppError::new(
            ErrorKind::Parse,
            format!("Sample regions must be between 1 and {}.", REGION_LOOKUP.len()),
        ));
    }
    let first = NaiveDate::from_ymd_opt(spec.year, spec.month, 1).ok_or_else(|| {
        AppError::new(
            ErrorKind::Parse,
            format!("Invalid sample month {}-{:02}.", spec.year, spec.month),
        )
    })?;
    let days: Vec<NaiveDate> = first.iter_days().take_while(|d| d.month() == spec.month).collect();

    let n = days.len() * spec.products;
    let damaged = spec.missing + spec.negative + spec.spikes;
    if damaged > n {
        return Err(AppError::new(
            ErrorKind::Parse,
            format!("Cannot damage {damaged} rows of a {n}-row sample."),
        ));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let noise = Normal::new(0.0, 0.12)
        .map_err(|e| AppError::new(ErrorKind::Parse, format!("Noise distribution error: {e}")))?;

    // Per-product base level so products are distinguishable.
    let bases: Vec<f64> = (0..spec.products).map(|_| rng.gen_range(10_000.0..30_000.0)).collect();

    let mut rows = Vec::with_capacity(n);
    for (d, date) in days.iter().enumerate() {
        let weekend = date.weekday().number_from_monday() >= 6;
        for (p, base) in bases.iter().enumerate() {
            let seasonal = if weekend { 1.15 } else { 1.0 };
            let amount = (base * seasonal * (1.0 + noise.sample(&mut rng))).max(1.0);
            rows.push(EntryRow {
                date: date.format(DEFAULT_DATE_FORMAT).to_string(),
                product_id: format!("{:03}", p + 1),
                sales_amount: Some((amount * 100.0).round() / 100.0),
                region: REGION_LOOKUP[(d + p) % spec.regions].0.to_string(),
            });
        }
    }

    let picks = index::sample(&mut rng, n, damaged).into_vec();
    let (missing, rest) = picks.split_at(spec.missing);
    let (negative, spikes) = rest.split_at(spec.negative);
    for &i in missing {
        rows[i].sales_amount = None;
    }
    for &i in negative {
        rows[i].sales_amount = rows[i].sales_amount.map(|v| -v);
    }
    for &i in spikes {
        rows[i].sales_amount = rows[i].sales_amount.map(|v| v * SPIKE_FACTOR);
    }

    Ok(rows)
}
