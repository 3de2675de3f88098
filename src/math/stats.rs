//! Descriptive statistics over `f64` slices.
//!
//! Quantiles use linear interpolation between the closest ranks:
//!
//! ```text
//! pos = (n - 1) * q
//! Q(q) = x[floor(pos)] + (pos - floor(pos)) * (x[floor(pos) + 1] - x[floor(pos)])
//! ```
//!
//! which is the common spreadsheet/dataframe default. Non-finite inputs are
//! ignored everywhere.

use serde::Serialize;

/// Arithmetic mean; `None` for an empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
    if n == 0 { None } else { Some(sum / n as f64) }
}

/// Quantile `q ∈ [0, 1]` with linear interpolation; `None` for an empty input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(quantile_sorted(&sorted, q))
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Inclusive Tukey fences `[Q1 - k·IQR, Q3 + k·IQR]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.lower && v <= self.upper
    }
}

/// Compute IQR fences with multiplier `k`; `None` for an empty input.
pub fn iqr_bounds(values: &[f64], k: f64) -> Option<IqrBounds> {
    let q1 = quantile(values, 0.25)?;
    let q3 = quantile(values, 0.75)?;
    let iqr = q3 - q1;
    Some(IqrBounds {
        q1,
        q3,
        lower: q1 - k * iqr,
        upper: q3 + k * iqr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_ignores_non_finite() {
        assert_eq!(mean(&[1.0, 2.0, f64::NAN, 3.0]), Some(2.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn quantile_interpolates_between_ranks() {
        let v = [100.0, 200.0, 300.0, 100_000.0];
        assert!((quantile(&v, 0.25).unwrap() - 175.0).abs() < 1e-9);
        assert!((quantile(&v, 0.75).unwrap() - 25_225.0).abs() < 1e-9);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn iqr_bounds_single_value_collapse() {
        let b = iqr_bounds(&[42.0], 1.5).unwrap();
        assert_eq!(b.iqr(), 0.0);
        assert!(b.contains(42.0));
        assert!(!b.contains(42.5));
        assert!(iqr_bounds(&[], 1.5).is_none());
    }
}
