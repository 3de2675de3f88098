//! Workbook writers.
//!
//! - the regional summary report (`Regional Summary` sheet)
//! - hand-entered rows saved as an analyzable source file

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tracing::info;

use crate::domain::EntryRow;
use crate::error::{AppError, ErrorKind};
use crate::io::ingest::CANONICAL_HEADERS;
use crate::report::RegionSummaryRow;

pub const SUMMARY_FILE_NAME: &str = "regional_sales_summary.xlsx";
pub const SUMMARY_SHEET_NAME: &str = "Regional Summary";

/// Column headers of the summary sheet, in write order.
pub const SUMMARY_HEADERS: [&str; 7] = [
    "Region",
    "Total Sales",
    "Avg Sales",
    "Median Sales",
    "Order Count",
    "Coverage Days",
    "Regional Rank",
];

/// Write the per-region table, one row per region in the given order.
pub fn write_regional_summary(path: &Path, rows: &[RegionSummaryRow]) -> Result<(), AppError> {
    build_summary(path, rows).map_err(|e| xlsx_err(path, e))?;
    info!(path = %path.display(), regions = rows.len(), "excel summary written");
    Ok(())
}

fn build_summary(path: &Path, rows: &[RegionSummaryRow]) -> Result<(), XlsxError> {
    let header = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SUMMARY_SHEET_NAME)?;

    for (col, name) in SUMMARY_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }

    for (i, r) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, r.region.as_str())?;
        sheet.write_number_with_format(row, 1, r.total_sales, &money)?;
        sheet.write_number_with_format(row, 2, r.avg_sales, &money)?;
        sheet.write_number_with_format(row, 3, r.median_sales, &money)?;
        sheet.write_number(row, 4, r.order_count as f64)?;
        sheet.write_number(row, 5, r.coverage_days as f64)?;
        sheet.write_number(row, 6, r.rank as f64)?;
    }
    sheet.set_column_width(0, 16)?;
    for col in 1..SUMMARY_HEADERS.len() as u16 {
        sheet.set_column_width(col, 15)?;
    }

    workbook.save(path)
}

/// Save hand-entered rows under the canonical headers.
///
/// A missing amount is left as an empty cell, which ingest reads back as
/// missing.
pub fn write_entry_rows(path: &Path, rows: &[EntryRow]) -> Result<(), AppError> {
    build_entries(path, rows).map_err(|e| xlsx_err(path, e))?;
    info!(path = %path.display(), rows = rows.len(), "entered rows saved");
    Ok(())
}

fn build_entries(path: &Path, rows: &[EntryRow]) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, name) in CANONICAL_HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }
    for (i, r) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, r.date.as_str())?;
        sheet.write_string(row, 1, r.product_id.as_str())?;
        if let Some(v) = r.sales_amount {
            sheet.write_number(row, 2, v)?;
        }
        sheet.write_string(row, 3, r.region.as_str())?;
    }

    workbook.save(path)
}

fn xlsx_err(path: &Path, e: XlsxError) -> AppError {
    AppError::new(
        ErrorKind::Output,
        format!("Failed to write workbook '{}': {e}", path.display()),
    )
}
