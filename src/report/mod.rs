//! Aggregation: read-only reducers over a cleaned dataset.
//!
//! Everything the charts, workbook, PDF and API response show is computed
//! here once; the writers only format these values.

pub mod format;

pub use format::*;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::CleanDataset;
use crate::math::{mean, median};

/// Sales summed per region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionTotal {
    pub region: String,
    pub total: f64,
}

/// Sales summed per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: f64,
}

/// One row of the regional summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummaryRow {
    pub region: String,
    pub total_sales: f64,
    pub avg_sales: f64,
    pub median_sales: f64,
    pub order_count: usize,
    pub coverage_days: usize,
    /// 1 = highest total; tied totals share the lowest rank.
    pub rank: usize,
}

/// Headline statistics for a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    pub total_sales: f64,
    /// Mean sales amount per record.
    pub avg_daily_sales: f64,
    pub top_region: Option<String>,
    pub top_region_sales: Option<f64>,
    pub bottom_region: Option<String>,
    pub data_days: usize,
    pub record_count: usize,
    /// Ordered by region label.
    pub region_totals: Vec<RegionTotal>,
    /// Ordered by date.
    pub daily_totals: Vec<DailyTotal>,
    /// Ordered by total, descending.
    pub regions: Vec<RegionSummaryRow>,
}

impl SalesSummary {
    /// Share of total sales taken by the top region, in percent.
    pub fn top_region_share(&self) -> Option<f64> {
        let top = self.top_region_sales?;
        if self.total_sales > 0.0 {
            Some(top / self.total_sales * 100.0)
        } else {
            None
        }
    }
}

pub fn summarize(data: &CleanDataset) -> SalesSummary {
    let region_totals = region_totals(data);
    let top = top_region(&region_totals);
    SalesSummary {
        total_sales: total_sales(data),
        avg_daily_sales: mean_sales(data).unwrap_or(0.0),
        top_region: top.map(|t| t.region.clone()),
        top_region_sales: top.map(|t| t.total),
        bottom_region: bottom_region(&region_totals).map(|t| t.region.clone()),
        data_days: distinct_dates(data),
        record_count: data.len(),
        daily_totals: daily_totals(data),
        regions: regional_summary(data),
        region_totals,
    }
}

pub fn total_sales(data: &CleanDataset) -> f64 {
    data.records().iter().map(|r| r.sales_amount).sum()
}

pub fn mean_sales(data: &CleanDataset) -> Option<f64> {
    let amounts: Vec<f64> = data.records().iter().map(|r| r.sales_amount).collect();
    mean(&amounts)
}

pub fn distinct_dates(data: &CleanDataset) -> usize {
    data.records().iter().map(|r| r.date).collect::<BTreeSet<_>>().len()
}

pub fn region_totals(data: &CleanDataset) -> Vec<RegionTotal> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for r in data.records() {
        *totals.entry(r.region.as_str()).or_insert(0.0) += r.sales_amount;
    }
    totals
        .into_iter()
        .map(|(region, total)| RegionTotal {
            region: region.to_string(),
            total,
        })
        .collect()
}

/// Region with the largest total; ties go to the first label in order.
pub fn top_region(totals: &[RegionTotal]) -> Option<&RegionTotal> {
    totals.iter().fold(None, |best: Option<&RegionTotal>, t| match best {
        Some(b) if b.total >= t.total => Some(b),
        _ => Some(t),
    })
}

/// Region with the smallest total; ties go to the first label in order.
pub fn bottom_region(totals: &[RegionTotal]) -> Option<&RegionTotal> {
    totals.iter().fold(None, |best: Option<&RegionTotal>, t| match best {
        Some(b) if b.total <= t.total => Some(b),
        _ => Some(t),
    })
}

pub fn daily_totals(data: &CleanDataset) -> Vec<DailyTotal> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in data.records() {
        *totals.entry(r.date).or_insert(0.0) += r.sales_amount;
    }
    totals.into_iter().map(|(date, total)| DailyTotal { date, total }).collect()
}

/// Per-region table, sorted by total sales descending.
pub fn regional_summary(data: &CleanDataset) -> Vec<RegionSummaryRow> {
    let mut groups: HashMap<&str, (Vec<f64>, BTreeSet<NaiveDate>)> = HashMap::new();
    for r in data.records() {
        let g = groups.entry(r.region.as_str()).or_default();
        g.0.push(r.sales_amount);
        g.1.insert(r.date);
    }

    let mut rows: Vec<RegionSummaryRow> = groups
        .into_iter()
        .map(|(region, (amounts, dates))| RegionSummaryRow {
            region: region.to_string(),
            total_sales: amounts.iter().sum(),
            avg_sales: mean(&amounts).unwrap_or(0.0),
            median_sales: median(&amounts).unwrap_or(0.0),
            order_count: amounts.len(),
            coverage_days: dates.len(),
            rank: 0,
        })
        .collect();

    let totals: Vec<f64> = rows.iter().map(|r| r.total_sales).collect();
    for row in &mut rows {
        row.rank = 1 + totals.iter().filter(|&&t| t > row.total_sales).count();
    }
    rows.sort_by(|a, b| {
        b.total_sales
            .partial_cmp(&a.total_sales)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.region.cmp(&b.region))
    });
    rows
}
