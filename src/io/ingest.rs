//! Sales file ingest.
//!
//! This module turns a delimited-text or spreadsheet file into a raw
//! `Dataset`. It does not clean anything: dates stay as source text, amounts
//! stay missing when blank, and region labels are untouched.
//!
//! Design goals:
//! - **Strict schema** for required columns (one error naming every absent column)
//! - **Verbatim values** (only BOM stripping and whitespace trimming)
//! - **Separation of concerns**: no cleaning logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate};
use csv::StringRecord;
use tracing::info;

use crate::domain::{Dataset, Record};
use crate::error::{AppError, ErrorKind};

/// Physical layout of an input file, inferred from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
    Spreadsheet,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(SourceFormat::Delimited),
            "xlsx" | "xls" | "xlsm" | "ods" => Ok(SourceFormat::Spreadsheet),
            _ => Err(AppError::new(
                ErrorKind::UnsupportedFormat,
                format!("Unsupported file format '.{ext}'. Only CSV and Excel (.xlsx/.xls) are supported."),
            )),
        }
    }
}

/// Canonical columns every source must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Date,
    ProductId,
    SalesAmount,
    Region,
}

impl Column {
    const ALL: [Column; 4] = [Column::Date, Column::ProductId, Column::SalesAmount, Column::Region];

    fn canonical(self) -> &'static str {
        match self {
            Column::Date => "date",
            Column::ProductId => "product_id",
            Column::SalesAmount => "sales_amount",
            Column::Region => "region",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Date => &["date", "日期"],
            Column::ProductId => &["product_id", "product", "产品id"],
            Column::SalesAmount => &["sales_amount", "sales", "销售额"],
            Column::Region => &["region", "区域"],
        }
    }
}

/// Header names written by `save_records` and the sample generator.
pub const CANONICAL_HEADERS: [&str; 4] = ["date", "product_id", "sales_amount", "region"];

/// Resolved column positions.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    product_id: usize,
    sales_amount: usize,
    region: usize,
}

/// Load a sales file, dispatching on its extension.
///
/// `date_format` is only used to render native spreadsheet date cells so the
/// date normalization stage sees them in the configured pattern.
pub fn load_dataset(path: &Path, date_format: &str) -> Result<Dataset, AppError> {
    if !path.exists() {
        return Err(AppError::new(
            ErrorKind::SourceNotFound,
            format!("Data file not found: '{}'", path.display()),
        ));
    }

    let format = SourceFormat::from_path(path)?;
    let dataset = match format {
        SourceFormat::Delimited => load_delimited(path)?,
        SourceFormat::Spreadsheet => load_spreadsheet(path, date_format)?,
    };

    info!(
        path = %path.display(),
        ?format,
        rows = dataset.len(),
        "data imported"
    );
    Ok(dataset)
}

fn load_delimited(path: &Path) -> Result<Dataset, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(ErrorKind::Parse, format!("Failed to open CSV '{}': {e}", path.display()))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(ErrorKind::Parse, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let columns = resolve_columns(headers.iter())?;

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, lines are 1-based.
        let line = idx + 2;
        let row = result.map_err(|e| AppError::new(ErrorKind::Parse, format!("Line {line}: CSV parse error: {e}")))?;
        if is_blank(&row) {
            continue;
        }
        records.push(build_record(line, &columns, |i| row.get(i).unwrap_or("").to_string())?);
    }

    Ok(Dataset::new(records))
}

fn load_spreadsheet(path: &Path, date_format: &str) -> Result<Dataset, AppError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        AppError::new(ErrorKind::Parse, format!("Failed to open workbook '{}': {e}", path.display()))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::new(ErrorKind::Parse, "Workbook has no worksheets."))?
        .map_err(|e| AppError::new(ErrorKind::Parse, format!("Failed to read first worksheet: {e}")))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| AppError::new(ErrorKind::Parse, "Worksheet is empty (no header row)."))?;
    let header_names: Vec<String> = header_row.iter().map(|c| cell_text(c, date_format)).collect();
    let columns = resolve_columns(header_names.iter().map(String::as_str))?;

    let mut records = Vec::new();
    for (idx, row) in rows.enumerate() {
        let line = idx + 2;
        let cells: Vec<String> = row.iter().map(|c| cell_text(c, date_format)).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        records.push(build_record(line, &columns, |i| cells.get(i).cloned().unwrap_or_default())?);
    }

    Ok(Dataset::new(records))
}

fn resolve_columns<'a, I>(headers: I) -> Result<ColumnMap, AppError>
where
    I: Iterator<Item = &'a str>,
{
    let index: HashMap<String, usize> = headers
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect();

    let find = |col: Column| col.aliases().iter().find_map(|a| index.get(*a).copied());

    let missing: Vec<&str> = Column::ALL
        .iter()
        .filter(|c| find(**c).is_none())
        .map(|c| c.canonical())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::new(
            ErrorKind::MissingColumns,
            format!("Missing required columns: {}. Check data format.", missing.join(", ")),
        ));
    }

    // All four resolved above.
    let get = |col: Column| find(col).unwrap_or_default();
    Ok(ColumnMap {
        date: get(Column::Date),
        product_id: get(Column::ProductId),
        sales_amount: get(Column::SalesAmount),
        region: get(Column::Region),
    })
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet tools often emit UTF-8 CSVs with a BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_lowercase()
}

fn build_record<F>(line: usize, columns: &ColumnMap, cell: F) -> Result<Record, AppError>
where
    F: Fn(usize) -> String,
{
    let raw_amount = cell(columns.sales_amount);
    let sales_amount = parse_amount(raw_amount.trim())
        .map_err(|msg| AppError::new(ErrorKind::Parse, format!("Line {line}: {msg}")))?;

    Ok(Record {
        line,
        date_raw: cell(columns.date).trim().to_string(),
        date: None,
        product_id: cell(columns.product_id).trim().to_string(),
        sales_amount,
        region: cell(columns.region).trim().to_string(),
    })
}

/// Parse a sales cell: blank and the usual NA markers are missing, anything
/// else must be a finite number.
pub fn parse_amount(s: &str) -> Result<Option<f64>, String> {
    const MISSING: [&str; 6] = ["", "na", "n/a", "nan", "null", "none"];
    if MISSING.contains(&s.to_ascii_lowercase().as_str()) {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(format!("Invalid sales amount '{s}'.")),
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

fn cell_text(cell: &Data, date_format: &str) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(|d| d.format(date_format).to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) => iso_to_date(s)
            .map(|d| d.format(date_format).to_string())
            .unwrap_or_else(|| s.clone()),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{e:?}"),
    }
}

fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Date part of an ISO 8601 cell (`2025-10-01` or `2025-10-01T00:00:00`).
fn iso_to_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()
}

/// Excel serial day number (1900 date system) to a calendar date.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::normalize_dates;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_rows_are_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "sales.csv",
            "\u{feff}Date,Product_ID,Sales_Amount,Region\n10/01/2025,001,1200.5,华北\nbad,002,,East\n",
        );

        let ds = load_dataset(&path, "%m/%d/%Y").unwrap();
        assert_eq!(ds.len(), 2);
        let first = &ds.records[0];
        assert_eq!(first.line, 2);
        assert_eq!(first.date_raw, "10/01/2025");
        assert_eq!(first.date, None);
        assert_eq!(first.product_id, "001");
        assert_eq!(first.sales_amount, Some(1200.5));
        assert_eq!(first.region, "华北");
        assert_eq!(ds.records[1].sales_amount, None);
        assert_eq!(ds.records[1].date_raw, "bad");
    }

    #[test]
    fn chinese_headers_are_recognized() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "cn.csv", "日期,产品ID,销售额,区域\n10/02/2025,001,10,华东\n");
        let ds = load_dataset(&path, "%m/%d/%Y").unwrap();
        assert_eq!(ds.records[0].region, "华东");
    }

    #[test]
    fn missing_columns_are_all_named() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "partial.csv", "date,sales\n10/01/2025,1\n");
        let err = load_dataset(&path, "%m/%d/%Y").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingColumns);
        assert!(err.message().contains("product_id"));
        assert!(err.message().contains("region"));
    }

    #[test]
    fn missing_file_and_bad_extension() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset(&dir.path().join("nope.csv"), "%m/%d/%Y").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceNotFound);

        let path = write_csv(&dir, "data.json", "{}");
        let err = load_dataset(&path, "%m/%d/%Y").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn non_numeric_sales_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "bad.csv", "date,product_id,sales_amount,region\n10/01/2025,1,lots,East\n");
        let err = load_dataset(&path, "%m/%d/%Y").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.message().starts_with("Line 2"));
    }

    #[test]
    fn amount_markers() {
        assert_eq!(parse_amount("NaN"), Ok(None));
        assert_eq!(parse_amount("n/a"), Ok(None));
        assert_eq!(parse_amount("-500"), Ok(Some(-500.0)));
        assert!(parse_amount("inf").is_err());
    }

    #[test]
    fn iso_date_cells_use_the_input_pattern() {
        let cell = Data::DateTimeIso("2025-10-01".into());
        assert_eq!(cell_text(&cell, "%m/%d/%Y"), "10/01/2025");
        let cell = Data::DateTimeIso("2025-10-02T00:00:00".into());
        assert_eq!(cell_text(&cell, "%m/%d/%Y"), "10/02/2025");
        let cell = Data::DurationIso("PT1H".into());
        assert_eq!(cell_text(&cell, "%m/%d/%Y"), "PT1H");

        let ds = Dataset::new(vec![Record {
            line: 2,
            date_raw: cell_text(&Data::DateTimeIso("2025-10-01".into()), "%m/%d/%Y"),
            date: None,
            product_id: "P1".into(),
            sales_amount: Some(10.0),
            region: "East".into(),
        }]);
        let out = normalize_dates(&ds, "%m/%d/%Y");
        assert_eq!(out.report.rows_out, 1);
    }

    #[test]
    fn workbook_date_cells_are_read() {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dated.xlsx");
        let date_fmt = Format::new().set_num_format("yyyy-mm-dd");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in CANONICAL_HEADERS.iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        let date = ExcelDateTime::from_ymd(2025, 10, 1).unwrap();
        sheet.write_datetime_with_format(1, 0, &date, &date_fmt).unwrap();
        sheet.write_string(1, 1, "P1").unwrap();
        sheet.write_number(1, 2, 1200.0).unwrap();
        sheet.write_string(1, 3, "华北").unwrap();
        workbook.save(&path).unwrap();

        let ds = load_dataset(&path, "%m/%d/%Y").unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].date_raw, "10/01/2025");
        assert_eq!(ds.records[0].sales_amount, Some(1200.0));

        let out = normalize_dates(&ds, "%m/%d/%Y");
        assert_eq!(out.report.rows_out, 1);
        assert_eq!(out.dataset.records[0].date, NaiveDate::from_ymd_opt(2025, 10, 1));
    }

    #[test]
    fn excel_serial_dates() {
        assert_eq!(excel_serial_to_date(45931.0), NaiveDate::from_ymd_opt(2025, 10, 1));
        assert_eq!(excel_serial_to_date(0.0), None);
    }
}
