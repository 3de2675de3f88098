//! PDF analysis report.
//!
//! Sections: summary, visual analysis (chart reference), forecast table with
//! evaluation metrics, conclusions. Only builtin Helvetica is used, so text
//! outside Latin-1 is replaced before it reaches the page.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use tracing::info;

use crate::domain::{CategoryEncoding, ForecastRow, Metrics};
use crate::error::{AppError, ErrorKind};
use crate::report::{SalesSummary, fmt_amount, forecast_day_label};

pub const PDF_FILE_NAME: &str = "sales_analysis_report.pdf";

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 15.0;
const LAYER: &str = "Layer 1";

/// Everything the report shows, already computed.
#[derive(Debug, Clone, Copy)]
pub struct ReportContent<'a> {
    pub summary: &'a SalesSummary,
    pub metrics: &'a Metrics,
    pub forecast: &'a [ForecastRow],
    pub period_start: NaiveDate,
    pub regions: &'a CategoryEncoding,
    pub products: &'a CategoryEncoding,
    pub chart: &'a Path,
    pub generated_at: NaiveDateTime,
}

impl ReportContent<'_> {
    fn forecast_total(&self) -> f64 {
        self.forecast.iter().map(|r| r.predicted_amount).sum()
    }

    /// e.g. `October 2025`, from the first observed date.
    fn period_label(&self) -> String {
        self.summary
            .daily_totals
            .first()
            .map(|d| d.date.format("%B %Y").to_string())
            .unwrap_or_else(|| "n/a".to_string())
    }
}

/// Render the report to `path`.
pub fn write_sales_report(path: &Path, content: &ReportContent<'_>) -> Result<(), AppError> {
    let title = format!("Monthly Sales Analysis Report ({})", content.period_label());
    let (doc, page, layer) = PdfDocument::new(title.as_str(), Mm(PAGE_W), Mm(PAGE_H), LAYER);
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(|e| pdf_err(path, e))?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(|e| pdf_err(path, e))?;
    let layer = doc.get_page(page).get_layer(layer);

    let mut w = PageWriter {
        doc,
        layer,
        regular,
        bold,
        y: PAGE_H - MARGIN,
    };

    w.centered(&title, 16.0, true);
    w.centered(
        &format!("Generated: {}", content.generated_at.format("%Y-%m-%d %H:%M:%S")),
        10.0,
        false,
    );
    w.gap(8.0);

    summary_section(&mut w, content);
    visual_section(&mut w, content);
    forecast_section(&mut w, content);
    w.new_page();
    conclusions_section(&mut w, content);

    let file = File::create(path).map_err(|e| {
        AppError::new(ErrorKind::Output, format!("Failed to create PDF '{}': {e}", path.display()))
    })?;
    w.doc
        .save(&mut BufWriter::new(file))
        .map_err(|e| pdf_err(path, e))?;

    info!(path = %path.display(), "pdf report written");
    Ok(())
}

fn summary_section(w: &mut PageWriter, c: &ReportContent<'_>) {
    let s = c.summary;
    w.heading("I. Report Summary");
    w.text(&format!("1. Total sales: {}", fmt_amount(s.total_sales)));
    w.text(&format!("2. Average sales per record: {}", fmt_amount(s.avg_daily_sales)));
    if let (Some(top), Some(total)) = (&s.top_region, s.top_region_sales) {
        let share = s.top_region_share().unwrap_or(0.0);
        w.text(&format!(
            "3. Top performing region: {top} ({}, {share:.1}% of total)",
            fmt_amount(total)
        ));
    }
    let (first, last) = (s.daily_totals.first(), s.daily_totals.last());
    if let (Some(first), Some(last)) = (first, last) {
        w.text(&format!(
            "4. Data coverage: {} to {} ({} valid days)",
            first.date, last.date, s.data_days
        ));
    }
    w.gap(8.0);
}

fn visual_section(w: &mut PageWriter, c: &ReportContent<'_>) {
    w.heading("II. Visual Analysis");
    w.text("Daily sales trend and regional distribution:");
    w.text(&c.chart.display().to_string());
    w.gap(8.0);
}

fn forecast_section(w: &mut PageWriter, c: &ReportContent<'_>) {
    const COLS: [f32; 4] = [MARGIN, MARGIN + 30.0, MARGIN + 75.0, MARGIN + 120.0];

    w.heading(&format!("III. Sales Forecast (First {} Days)", c.forecast.len()));
    w.row(&COLS, &["Date", "Region", "Product", "Forecast Sales"].map(String::from), true);
    for r in c.forecast {
        let region = c.regions.label(r.region_code).unwrap_or("?");
        let product = c.products.label(r.product_code).unwrap_or("?");
        w.row(
            &COLS,
            &[
                forecast_day_label(c.period_start, r.day_of_month),
                format!("{region} ({})", r.region_code),
                format!("{product} ({})", r.product_code),
                fmt_amount(r.predicted_amount),
            ],
            false,
        );
    }
    w.gap(4.0);
    w.text(&format!(
        "Model evaluation: MAE {} | RMSE {}",
        fmt_amount(c.metrics.mae),
        fmt_amount(c.metrics.rmse)
    ));
}

fn conclusions_section(w: &mut PageWriter, c: &ReportContent<'_>) {
    let s = c.summary;
    w.heading("IV. Conclusions & Recommendations");
    if let Some(top) = &s.top_region {
        w.text(&format!(
            "1. Performance highlight: {top} region performed best. Consider replicating its strategies."
        ));
    }
    if let Some(bottom) = &s.bottom_region {
        w.text(&format!(
            "2. Improvement areas: review underperforming regions (e.g., {bottom}) for demand gaps."
        ));
    }
    w.text(&format!(
        "3. Forecast reference: total forecast for the first {} days of {}: {}.",
        c.forecast.len(),
        c.period_start.format("%B"),
        fmt_amount(c.forecast_total())
    ));
    w.text("4. Data quality: outliers and missing values have been cleaned before modeling.");
}

/// Cursor-based text layout over builtin fonts.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Baseline of the next line, in mm from the bottom edge.
    y: f32,
}

impl PageWriter {
    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_H - MARGIN;
    }

    fn advance(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.new_page();
        }
        self.y -= height;
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn font(&self, bold: bool) -> &IndirectFontRef {
        if bold { &self.bold } else { &self.regular }
    }

    fn heading(&mut self, text: &str) {
        self.advance(8.0);
        self.layer
            .use_text(latin1(text), 14.0, Mm(MARGIN), Mm(self.y), self.font(true));
        self.gap(3.0);
    }

    fn text(&mut self, text: &str) {
        self.advance(6.0);
        self.layer
            .use_text(latin1(text), 11.0, Mm(MARGIN), Mm(self.y), self.font(false));
    }

    fn centered(&mut self, text: &str, size: f32, bold: bool) {
        self.advance(size * 0.6);
        // Helvetica averages about half an em per glyph.
        let width_mm = text.chars().count() as f32 * size * 0.5 * 0.3528;
        let x = ((PAGE_W - width_mm) / 2.0).max(MARGIN);
        self.layer.use_text(latin1(text), size, Mm(x), Mm(self.y), self.font(bold));
    }

    fn row(&mut self, cols: &[f32], cells: &[String], bold: bool) {
        self.advance(7.0);
        for (x, cell) in cols.iter().zip(cells) {
            self.layer
                .use_text(latin1(cell), 11.0, Mm(*x), Mm(self.y), self.font(bold));
        }
    }
}

/// Builtin PDF fonts cover Latin-1 only.
fn latin1(s: &str) -> String {
    s.chars().map(|c| if (c as u32) < 0x100 { c } else { '?' }).collect()
}

fn pdf_err(path: &Path, e: impl std::fmt::Display) -> AppError {
    AppError::new(
        ErrorKind::Output,
        format!("Failed to write PDF '{}': {e}", path.display()),
    )
}
